// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Best-effort deep copy of values crossing a socket boundary.
//!
//! Plain data is always copied. Runtime objects are handled by kind:
//!
//! * handle kinds (`ComponentRef`, `ToolHandle`, `Toolset`) are passed by
//!   reference without attempting a copy, and this is not a warning;
//! * data objects are copied through `RuntimeObject::try_clone`; when that
//!   returns `None` the original reference is passed on and the object's type
//!   name is reported in [`Copied::aliased`].
//!
//! Aliasing never fails a run. The engine turns every aliased type name into
//! a [`CopyWarning`] on the run output.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::observability::messages::component::ValueAliased;
use crate::observability::messages::StructuredLog;
use crate::types::Value;

/// Result of a copy, with the type names of objects that had to be shared.
#[derive(Debug, Clone)]
pub struct Copied<T> {
    pub value: T,
    pub aliased: Vec<String>,
}

impl<T> Copied<T> {
    pub fn is_aliased(&self) -> bool {
        !self.aliased.is_empty()
    }
}

/// A value that was passed by reference because it could not be copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyWarning {
    /// Component receiving the value (or producing it, for collected outputs).
    pub component: String,
    pub socket: String,
    pub type_name: String,
}

pub fn copy_value(value: &Value) -> Copied<Value> {
    let mut aliased = Vec::new();
    let value = copy_into(value, &mut aliased);
    Copied { value, aliased }
}

/// Copy every value of a socket map.
pub fn copy_values(values: &BTreeMap<String, Value>) -> Copied<BTreeMap<String, Value>> {
    let mut aliased = Vec::new();
    let value = values
        .iter()
        .map(|(socket, value)| (socket.clone(), copy_into(value, &mut aliased)))
        .collect();
    Copied { value, aliased }
}

fn copy_into(value: &Value, aliased: &mut Vec<String>) -> Value {
    match value {
        Value::List(items) => Value::List(items.iter().map(|v| copy_into(v, aliased)).collect()),
        Value::Map(entries) => Value::Map(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), copy_into(v, aliased)))
                .collect(),
        ),
        Value::Object(object) if object.kind().is_handle() => Value::Object(Arc::clone(object)),
        Value::Object(object) => match object.try_clone() {
            Some(copy) => Value::Object(copy),
            None => {
                aliased.push(object.type_name().to_string());
                Value::Object(Arc::clone(object))
            }
        },
        scalar => scalar.clone(),
    }
}

/// Copy a value bound for `component.socket`, logging and collecting a
/// warning for every object that had to be shared.
pub(crate) fn copy_for(
    component: &str,
    socket: &str,
    value: &Value,
    warnings: &mut Vec<CopyWarning>,
) -> Value {
    let copied = copy_value(value);
    for type_name in copied.aliased {
        ValueAliased {
            component,
            socket,
            type_name: &type_name,
        }
        .log();
        warnings.push(CopyWarning {
            component: component.to_string(),
            socket: socket.to_string(),
            type_name,
        });
    }
    copied.value
}
