// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Typed, named endpoints on a component.
//!
//! Every component declares a fixed set of [`InputSocket`]s and [`OutputSocket`]s.
//! Connections join an output socket of one component to an input socket of
//! another; they are only legal when the sender's [`SocketType`] is compatible
//! with the receiver's.
//!
//! # Compatibility rules
//!
//! A sender type `S` may feed a receiver type `R` when:
//! 1. `S == R`
//! 2. `R` is `Any`
//! 3. `S` is a union and every member of `S` may feed `R`
//! 4. `R` is a union and `S` may feed at least one member of `R`
//! 5. both are lists and the element types are compatible
//!
//! `Any` as a *sender* only feeds `Any`; the engine never guesses what an
//! untyped output will carry.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::value::Value;

/// Declared type of a socket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocketType {
    Any,
    Null,
    Bool,
    Int,
    Float,
    Str,
    List(Box<SocketType>),
    Map,
    /// A runtime object identified by its `RuntimeObject::type_name`.
    Object(String),
    Union(Vec<SocketType>),
}

impl SocketType {
    pub fn list(element: SocketType) -> Self {
        SocketType::List(Box::new(element))
    }

    pub fn object(type_name: impl Into<String>) -> Self {
        SocketType::Object(type_name.into())
    }

    pub fn union(members: impl IntoIterator<Item = SocketType>) -> Self {
        SocketType::Union(members.into_iter().collect())
    }

    /// Whether a connection from a socket of this type into `receiver` is legal.
    pub fn is_compatible_with(&self, receiver: &SocketType) -> bool {
        if self == receiver {
            return true;
        }
        match (self, receiver) {
            (_, SocketType::Any) => true,
            (SocketType::Union(members), _) => {
                members.iter().all(|member| member.is_compatible_with(receiver))
            }
            (_, SocketType::Union(members)) => {
                members.iter().any(|member| self.is_compatible_with(member))
            }
            (SocketType::List(sender), SocketType::List(receiver)) => {
                sender.is_compatible_with(receiver)
            }
            _ => false,
        }
    }

    /// Whether a runtime value conforms to this type.
    ///
    /// Integers are accepted where floats are declared.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (SocketType::Any, _) => true,
            (SocketType::Null, Value::Null) => true,
            (SocketType::Bool, Value::Bool(_)) => true,
            (SocketType::Int, Value::Int(_)) => true,
            (SocketType::Float, Value::Float(_) | Value::Int(_)) => true,
            (SocketType::Str, Value::Str(_)) => true,
            (SocketType::Map, Value::Map(_)) => true,
            (SocketType::List(element), Value::List(items)) => {
                items.iter().all(|item| element.accepts(item))
            }
            (SocketType::Object(name), Value::Object(object)) => object.type_name() == name,
            (SocketType::Union(members), value) => members.iter().any(|m| m.accepts(value)),
            _ => false,
        }
    }
}

impl fmt::Display for SocketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocketType::Any => write!(f, "any"),
            SocketType::Null => write!(f, "null"),
            SocketType::Bool => write!(f, "bool"),
            SocketType::Int => write!(f, "int"),
            SocketType::Float => write!(f, "float"),
            SocketType::Str => write!(f, "str"),
            SocketType::Map => write!(f, "map"),
            SocketType::List(element) => write!(f, "list[{}]", element),
            SocketType::Object(name) => write!(f, "object<{}>", name),
            SocketType::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", member)?;
                }
                Ok(())
            }
        }
    }
}

/// Direction of a socket, used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketDirection {
    Input,
    Output,
}

impl fmt::Display for SocketDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocketDirection::Input => write!(f, "input"),
            SocketDirection::Output => write!(f, "output"),
        }
    }
}

/// An input endpoint of a component.
///
/// A socket without a default is required: the component cannot run until a
/// value arrives. A variadic socket aggregates values from any number of
/// incoming connections into a `Value::List`, ordered by connection
/// declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSocket {
    pub name: String,
    pub socket_type: SocketType,
    pub default: Option<Value>,
    pub variadic: bool,
}

impl InputSocket {
    pub fn required(name: impl Into<String>, socket_type: SocketType) -> Self {
        Self {
            name: name.into(),
            socket_type,
            default: None,
            variadic: false,
        }
    }

    pub fn optional(name: impl Into<String>, socket_type: SocketType, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            socket_type,
            default: Some(default.into()),
            variadic: false,
        }
    }

    pub fn variadic(name: impl Into<String>, socket_type: SocketType) -> Self {
        Self {
            name: name.into(),
            socket_type,
            default: None,
            variadic: true,
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    /// Type a single connection into this socket must be compatible with.
    ///
    /// Variadic sockets declared as `list[T]` take `T` per connection.
    pub fn connection_type(&self) -> &SocketType {
        match (&self.socket_type, self.variadic) {
            (SocketType::List(element), true) => element,
            (socket_type, _) => socket_type,
        }
    }
}

/// An output endpoint of a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSocket {
    pub name: String,
    pub socket_type: SocketType,
}

impl OutputSocket {
    pub fn new(name: impl Into<String>, socket_type: SocketType) -> Self {
        Self {
            name: name.into(),
            socket_type,
        }
    }
}

/// A `component.socket` reference as written in `connect` calls and documents.
///
/// The socket part is optional; `"retriever"` names the component only and
/// leaves the socket to be inferred.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SocketRef {
    pub component: String,
    pub socket: Option<String>,
}

impl SocketRef {
    pub fn parse(reference: &str) -> Self {
        match reference.split_once('.') {
            Some((component, socket)) => Self {
                component: component.to_string(),
                socket: Some(socket.to_string()),
            },
            None => Self {
                component: reference.to_string(),
                socket: None,
            },
        }
    }

    pub fn new(component: impl Into<String>, socket: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            socket: Some(socket.into()),
        }
    }
}

impl fmt::Display for SocketRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.socket {
            Some(socket) => write!(f, "{}.{}", self.component, socket),
            None => write!(f, "{}", self.component),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compatibility_table() {
        struct Case {
            name: &'static str,
            sender: SocketType,
            receiver: SocketType,
            expected: bool,
        }

        let cases = vec![
            Case { name: "identical", sender: SocketType::Str, receiver: SocketType::Str, expected: true },
            Case { name: "into any", sender: SocketType::Int, receiver: SocketType::Any, expected: true },
            Case { name: "any into str", sender: SocketType::Any, receiver: SocketType::Str, expected: false },
            Case { name: "different scalars", sender: SocketType::Int, receiver: SocketType::Str, expected: false },
            Case {
                name: "into union",
                sender: SocketType::Int,
                receiver: SocketType::union([SocketType::Str, SocketType::Int]),
                expected: true,
            },
            Case {
                name: "union into superset union",
                sender: SocketType::union([SocketType::Int, SocketType::Str]),
                receiver: SocketType::union([SocketType::Str, SocketType::Int, SocketType::Float]),
                expected: true,
            },
            Case {
                name: "union into narrower type",
                sender: SocketType::union([SocketType::Int, SocketType::Str]),
                receiver: SocketType::Int,
                expected: false,
            },
            Case {
                name: "nested lists",
                sender: SocketType::list(SocketType::Int),
                receiver: SocketType::list(SocketType::union([SocketType::Int, SocketType::Null])),
                expected: true,
            },
            Case {
                name: "objects by name",
                sender: SocketType::object("client"),
                receiver: SocketType::object("template"),
                expected: false,
            },
        ];

        for case in cases {
            assert_eq!(
                case.sender.is_compatible_with(&case.receiver),
                case.expected,
                "case '{}' failed",
                case.name
            );
        }
    }

    #[test]
    fn test_accepts_values() {
        assert!(SocketType::Float.accepts(&Value::Int(3)));
        assert!(!SocketType::Int.accepts(&Value::Float(3.0)));
        assert!(SocketType::list(SocketType::Str).accepts(&Value::List(vec!["a".into(), "b".into()])));
        assert!(!SocketType::list(SocketType::Str).accepts(&Value::List(vec![Value::Int(1)])));
        assert!(SocketType::union([SocketType::Null, SocketType::Str]).accepts(&Value::Null));
    }

    #[test]
    fn test_socket_ref_parse() {
        assert_eq!(SocketRef::parse("llm.replies"), SocketRef::new("llm", "replies"));
        assert_eq!(SocketRef::parse("llm").socket, None);
        // Only the first dot separates the component from the socket
        assert_eq!(SocketRef::parse("a.b.c").socket.as_deref(), Some("b.c"));
        assert_eq!(SocketRef::new("a", "b").to_string(), "a.b");
    }

    #[test]
    fn test_variadic_connection_type() {
        let socket = InputSocket::variadic("docs", SocketType::list(SocketType::Str));
        assert_eq!(socket.connection_type(), &SocketType::Str);
        let plain = InputSocket::required("text", SocketType::Str);
        assert_eq!(plain.connection_type(), &SocketType::Str);
        assert!(plain.is_required());
        assert!(!plain.with_default("x").is_required());
    }

    #[test]
    fn test_display() {
        let ty = SocketType::union([SocketType::list(SocketType::Str), SocketType::object("client")]);
        assert_eq!(ty.to_string(), "list[str] | object<client>");
    }
}
