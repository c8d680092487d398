// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Runtime values carried across sockets.
//!
//! A [`Value`] is either plain data (null, scalars, lists, maps) or an opaque
//! runtime object behind an `Arc`. Plain data can always be deep-copied. Runtime
//! objects decide for themselves: they report an [`ObjectKind`] and may offer a
//! fallible deep copy through [`RuntimeObject::try_clone`].
//!
//! `Value::clone` is shallow for objects (the `Arc` is shared). Deep copies are
//! made by `engine::copy_safety`, which is the only place that calls
//! `try_clone`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::any::Any;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Category of a runtime object, consulted by the copy-safety layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Ordinary data; deep-copied when possible.
    Data,
    /// A reference to another engine component.
    ComponentRef,
    /// A handle to an external tool or client (network client, template, ...).
    ToolHandle,
    /// A collection of tool handles.
    Toolset,
}

impl ObjectKind {
    /// Handles are always passed by reference, never deep-copied.
    pub fn is_handle(self) -> bool {
        !matches!(self, ObjectKind::Data)
    }
}

/// An opaque value living inside a [`Value::Object`].
pub trait RuntimeObject: Any + fmt::Debug + Send + Sync {
    /// Type name used for socket type checks (`SocketType::Object(name)`).
    fn type_name(&self) -> &str;

    fn kind(&self) -> ObjectKind {
        ObjectKind::Data
    }

    /// Deep copy of this object, or `None` when it cannot be copied.
    fn try_clone(&self) -> Option<Arc<dyn RuntimeObject>> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// Dynamically typed value flowing between components.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Object(Arc<dyn RuntimeObject>),
}

impl Value {
    /// Wrap a runtime object.
    pub fn object<T: RuntimeObject>(object: T) -> Self {
        Value::Object(Arc::new(object))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view; integers widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<dyn RuntimeObject>> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Borrow the wrapped object as a concrete type.
    pub fn downcast_object<T: RuntimeObject>(&self) -> Option<&T> {
        self.as_object()
            .and_then(|object| object.as_any().downcast_ref::<T>())
    }

    /// True when both values wrap the very same object allocation.
    pub fn same_object(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Look up a dotted path (`"user.age"`) through nested maps.
    ///
    /// An empty path returns the value itself.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return Some(self);
        }
        path.split('.').try_fold(self, |current, key| match current {
            Value::Map(map) => map.get(key),
            Value::List(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    /// Short label of the value's variant, used in diagnostics.
    pub fn type_label(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(object) => object.type_name(),
        }
    }

    /// Ordering between comparable values: numbers with numbers, strings with strings.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }

    /// Membership test: substring for strings, element for lists, key for maps.
    pub fn contains(&self, needle: &Value) -> bool {
        match (self, needle) {
            (Value::Str(haystack), Value::Str(n)) => haystack.contains(n.as_str()),
            (Value::List(items), n) => items.iter().any(|item| item == n),
            (Value::Map(map), Value::Str(key)) => map.contains_key(key),
            _ => false,
        }
    }

    /// JSON projection. Objects become a `{"$object": type_name}` marker.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Object(object) => serde_json::json!({ "$object": object.type_name() }),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => (*a as f64) == *b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Object(object) => write!(f, "<{}>", object.type_name()),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Blob;

    impl RuntimeObject for Blob {
        fn type_name(&self) -> &str {
            "blob"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn person() -> Value {
        Value::from(serde_json::json!({
            "name": "ada",
            "age": 36,
            "tags": ["math", "engines"]
        }))
    }

    #[test]
    fn test_get_path_walks_maps_and_lists() {
        let value = person();
        assert_eq!(value.get_path("name"), Some(&Value::from("ada")));
        assert_eq!(value.get_path("tags.1"), Some(&Value::from("engines")));
        assert_eq!(value.get_path("missing"), None);
        assert_eq!(value.get_path(""), Some(&value));
    }

    #[test]
    fn test_compare_mixes_ints_and_floats() {
        assert_eq!(Value::Int(3).compare(&Value::Float(3.5)), Some(Ordering::Less));
        assert_eq!(Value::from("b").compare(&Value::from("a")), Some(Ordering::Greater));
        assert_eq!(Value::from("b").compare(&Value::Int(1)), None);
    }

    #[test]
    fn test_objects_compare_by_identity() {
        let a = Value::object(Blob);
        let b = Value::object(Blob);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert!(a.same_object(&a.clone()));
        assert!(a.downcast_object::<Blob>().is_some());
    }

    #[test]
    fn test_json_projection_marks_objects() {
        let mut map = BTreeMap::new();
        map.insert("blob".to_string(), Value::object(Blob));
        map.insert("n".to_string(), Value::Int(1));
        let json = Value::Map(map).to_json();
        assert_eq!(json["blob"]["$object"], "blob");
        assert_eq!(json["n"], 1);
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let value: Value = serde_yaml::from_str("[1, 2.5, text, null]").unwrap();
        assert_eq!(
            value,
            Value::List(vec![Value::Int(1), Value::Float(2.5), Value::from("text"), Value::Null])
        );
    }

    #[test]
    fn test_contains() {
        assert!(Value::from("hello world").contains(&Value::from("world")));
        assert!(person().get_path("tags").unwrap().contains(&Value::from("math")));
        assert!(person().contains(&Value::from("age")));
        assert!(!Value::Int(1).contains(&Value::Int(1)));
    }
}
