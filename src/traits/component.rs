// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The component contract consumed by the engine.
//!
//! Any type that can describe its sockets, run against a map of input values,
//! and export its configuration is a [`Component`]. Types that can also be
//! rebuilt from that configuration implement [`FromConfig`] and can be
//! registered in a `ComponentRegistry` for pipeline deserialization.

use async_trait::async_trait;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::{ComponentError, ConfigError};
use crate::types::{InputSocket, ObjectKind, OutputSocket, RuntimeObject, Value};

/// Values handed to a component, keyed by input socket name.
///
/// Variadic sockets arrive as a `Value::List` ordered by connection
/// declaration order.
pub type ComponentInputs = BTreeMap<String, Value>;

/// Values emitted by a component, keyed by output socket name.
///
/// A component may leave sockets out; downstream connections from those
/// sockets are treated as not traversed for this run.
pub type ComponentOutputs = BTreeMap<String, Value>;

/// Serialized configuration of a component.
pub type ComponentConfig = serde_json::Map<String, serde_json::Value>;

#[async_trait]
pub trait Component: Send + Sync {
    /// Stable type identifier written into pipeline documents.
    fn type_name(&self) -> &str;

    fn input_sockets(&self) -> Vec<InputSocket>;

    fn output_sockets(&self) -> Vec<OutputSocket>;

    async fn run(&self, inputs: ComponentInputs) -> Result<ComponentOutputs, ComponentError>;

    /// Configuration that rebuilds an equivalent component through `FromConfig`.
    fn to_config(&self) -> ComponentConfig {
        ComponentConfig::new()
    }
}

/// Reconstruction half of the serialization pair.
pub trait FromConfig: Component + Sized + 'static {
    const TYPE_NAME: &'static str;

    fn from_config(config: &ComponentConfig) -> Result<Self, ConfigError>;
}

/// A reference to a component carried as a runtime value.
///
/// Handles are never deep-copied by the engine; every receiver sees the same
/// component instance.
#[derive(Clone)]
pub struct ComponentHandle(pub Arc<dyn Component>);

impl ComponentHandle {
    pub fn new(component: impl Component + 'static) -> Self {
        Self(Arc::new(component))
    }

    pub fn into_value(self) -> Value {
        Value::object(self)
    }
}

impl fmt::Debug for ComponentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentHandle")
            .field(&self.0.type_name())
            .finish()
    }
}

impl RuntimeObject for ComponentHandle {
    fn type_name(&self) -> &str {
        "component"
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::ComponentRef
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
