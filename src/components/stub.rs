// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Test components and runtime objects.

use async_trait::async_trait;
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::{ComponentError, ConfigError};
use crate::traits::{Component, ComponentConfig, ComponentInputs, ComponentOutputs, FromConfig};
use crate::types::{InputSocket, ObjectKind, OutputSocket, RuntimeObject, SocketType, Value};

/// Forwards its single input to the output socket of the same name.
#[derive(Debug, Clone, PartialEq)]
pub struct Passthrough {
    socket: String,
    socket_type: SocketType,
}

impl Passthrough {
    pub fn new(socket: &str, socket_type: SocketType) -> Self {
        Self {
            socket: socket.to_string(),
            socket_type,
        }
    }
}

#[async_trait]
impl Component for Passthrough {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn input_sockets(&self) -> Vec<InputSocket> {
        vec![InputSocket::required(&self.socket, self.socket_type.clone())]
    }

    fn output_sockets(&self) -> Vec<OutputSocket> {
        vec![OutputSocket::new(&self.socket, self.socket_type.clone())]
    }

    async fn run(&self, inputs: ComponentInputs) -> Result<ComponentOutputs, ComponentError> {
        Ok(inputs)
    }

    fn to_config(&self) -> ComponentConfig {
        let mut config = ComponentConfig::new();
        config.insert("socket".into(), self.socket.clone().into());
        config.insert(
            "type".into(),
            serde_json::to_value(&self.socket_type).unwrap_or_default(),
        );
        config
    }
}

impl FromConfig for Passthrough {
    const TYPE_NAME: &'static str = "passthrough";

    fn from_config(config: &ComponentConfig) -> Result<Self, ConfigError> {
        let socket = config
            .get("socket")
            .and_then(|s| s.as_str())
            .ok_or_else(|| ConfigError::InvalidComponentConfig {
                type_name: Self::TYPE_NAME.into(),
                reason: "missing 'socket'".into(),
            })?;
        let socket_type = match config.get("type") {
            Some(ty) => serde_json::from_value(ty.clone())?,
            None => SocketType::Any,
        };
        Ok(Self::new(socket, socket_type))
    }
}

type Behaviour = dyn Fn(&ComponentInputs) -> Result<ComponentOutputs, ComponentError> + Send + Sync;

/// Inputs of every invocation of a [`Scripted`] component.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<ComponentInputs>>>);

impl CallLog {
    pub fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn get(&self, call: usize) -> ComponentInputs {
        self.0.lock().unwrap()[call].clone()
    }
}

/// A component with declared sockets and a closure for a body.
pub struct Scripted {
    inputs: Vec<InputSocket>,
    outputs: Vec<OutputSocket>,
    behaviour: Arc<Behaviour>,
    calls: CallLog,
}

impl Scripted {
    pub fn new<F>(inputs: Vec<InputSocket>, outputs: Vec<OutputSocket>, behaviour: F) -> Self
    where
        F: Fn(&ComponentInputs) -> Result<ComponentOutputs, ComponentError> + Send + Sync + 'static,
    {
        Self {
            inputs,
            outputs,
            behaviour: Arc::new(behaviour),
            calls: CallLog::default(),
        }
    }

    /// A source with no inputs that emits `value` on `socket`.
    pub fn source(socket: &str, socket_type: SocketType, value: Value) -> Self {
        let name = socket.to_string();
        Self::new(vec![], vec![OutputSocket::new(socket, socket_type)], move |_| {
            Ok(ComponentOutputs::from([(name.clone(), value.clone())]))
        })
    }

    /// A sink that records its inputs and emits nothing.
    pub fn sink(inputs: Vec<InputSocket>) -> Self {
        Self::new(inputs, vec![], |_| Ok(ComponentOutputs::new()))
    }

    pub fn calls(&self) -> CallLog {
        self.calls.clone()
    }
}

#[async_trait]
impl Component for Scripted {
    fn type_name(&self) -> &str {
        "scripted"
    }

    fn input_sockets(&self) -> Vec<InputSocket> {
        self.inputs.clone()
    }

    fn output_sockets(&self) -> Vec<OutputSocket> {
        self.outputs.clone()
    }

    async fn run(&self, inputs: ComponentInputs) -> Result<ComponentOutputs, ComponentError> {
        self.calls.0.lock().unwrap().push(inputs.clone());
        (self.behaviour)(&inputs)
    }
}

/// Always fails.
pub struct Failing;

#[async_trait]
impl Component for Failing {
    fn type_name(&self) -> &str {
        "failing"
    }

    fn input_sockets(&self) -> Vec<InputSocket> {
        vec![InputSocket::required("value", SocketType::Any)]
    }

    fn output_sockets(&self) -> Vec<OutputSocket> {
        vec![OutputSocket::new("value", SocketType::Any)]
    }

    async fn run(&self, _inputs: ComponentInputs) -> Result<ComponentOutputs, ComponentError> {
        Err(ComponentError::failed("model endpoint returned 503"))
    }
}

/// A live client handle. Copying it would duplicate a connection, so the
/// engine must never try.
#[derive(Debug, Clone)]
pub struct NetworkClient {
    pub endpoint: String,
    clone_attempts: Arc<AtomicUsize>,
}

impl NetworkClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            clone_attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn clone_attempts(&self) -> usize {
        self.clone_attempts.load(Ordering::SeqCst)
    }
}

impl RuntimeObject for NetworkClient {
    fn type_name(&self) -> &str {
        "network_client"
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::ToolHandle
    }

    fn try_clone(&self) -> Option<Arc<dyn RuntimeObject>> {
        self.clone_attempts.fetch_add(1, Ordering::SeqCst);
        None
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Plain data object that supports deep copies.
#[derive(Debug, Clone)]
pub struct ClonableDocument {
    pub content: String,
}

impl ClonableDocument {
    pub fn new(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }
}

impl RuntimeObject for ClonableDocument {
    fn type_name(&self) -> &str {
        "document"
    }

    fn try_clone(&self) -> Option<Arc<dyn RuntimeObject>> {
        Some(Arc::new(self.clone()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Data object that cannot be copied, like a compiled template.
#[derive(Debug)]
pub struct OpaqueTemplate {
    pub source: String,
}

impl OpaqueTemplate {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
        }
    }
}

impl RuntimeObject for OpaqueTemplate {
    fn type_name(&self) -> &str {
        "opaque_template"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
