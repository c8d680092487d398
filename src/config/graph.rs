// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Connection graph: components joined through output-socket → input-socket edges.
//!
//! The graph is stored as an arena. Components live in a `Vec` and are
//! addressed by [`NodeIndex`]; connections refer to nodes by index, never by
//! pointer, so cycles in the graph are plain data.
//!
//! Validation results are cached and dropped whenever the topology changes, so
//! `validate()` always reflects the current graph and is cheap to call
//! repeatedly.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::config::consts::DEFAULT_MAX_RUNS_PER_COMPONENT;
use crate::config::validation::{validate_pipeline, ExecutionPlan};
use crate::errors::GraphError;
use crate::observability::messages::validation::ConnectionAdded;
use crate::observability::messages::StructuredLog;
use crate::traits::Component;
use crate::types::{InputSocket, OutputSocket, SocketDirection, SocketRef};

/// Position of a component in the pipeline arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub usize);

/// Per-component scheduling options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComponentOptions {
    /// Allows the component to sit on a cycle and run more than once per invocation.
    pub loop_participating: bool,
    /// Overrides the pipeline-wide maximum number of runs per invocation.
    pub max_runs: Option<usize>,
}

impl ComponentOptions {
    pub fn looping() -> Self {
        Self {
            loop_participating: true,
            max_runs: None,
        }
    }

    pub fn with_max_runs(mut self, max_runs: usize) -> Self {
        self.max_runs = Some(max_runs);
        self
    }
}

/// A component placed in the graph, with its sockets captured at insertion time.
pub(crate) struct Node {
    pub name: String,
    pub component: Arc<dyn Component>,
    pub inputs: Vec<InputSocket>,
    pub outputs: Vec<OutputSocket>,
    pub options: ComponentOptions,
}

impl Node {
    pub fn input(&self, socket: &str) -> Option<&InputSocket> {
        self.inputs.iter().find(|s| s.name == socket)
    }

    pub fn output(&self, socket: &str) -> Option<&OutputSocket> {
        self.outputs.iter().find(|s| s.name == socket)
    }
}

/// A directed edge from an output socket to an input socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub sender: NodeIndex,
    pub sender_socket: String,
    pub receiver: NodeIndex,
    pub receiver_socket: String,
}

/// A connection described by component names, as exposed to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub sender: SocketRef,
    pub receiver: SocketRef,
}

/// A graph of components and the connections between them.
pub struct Pipeline {
    pub(crate) nodes: Vec<Node>,
    pub(crate) connections: Vec<Connection>,
    metadata: serde_json::Map<String, serde_json::Value>,
    max_runs_per_component: usize,
    plan: OnceLock<Result<Arc<ExecutionPlan>, Vec<GraphError>>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            connections: Vec::new(),
            metadata: serde_json::Map::new(),
            max_runs_per_component: DEFAULT_MAX_RUNS_PER_COMPONENT,
            plan: OnceLock::new(),
        }
    }

    /// Set the engine-wide cap on runs per component per invocation (minimum 1).
    pub fn with_max_runs_per_component(mut self, max_runs: usize) -> Self {
        self.max_runs_per_component = max_runs.max(1);
        self
    }

    pub fn max_runs_per_component(&self) -> usize {
        self.max_runs_per_component
    }

    pub fn metadata(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut serde_json::Map<String, serde_json::Value> {
        &mut self.metadata
    }

    /// Add a component that runs at most once per invocation.
    pub fn add_component(
        &mut self,
        name: impl Into<String>,
        component: impl Component + 'static,
    ) -> Result<NodeIndex, GraphError> {
        self.insert_component(name, Arc::new(component), ComponentOptions::default())
    }

    /// Add a component with explicit scheduling options.
    pub fn add_component_with(
        &mut self,
        name: impl Into<String>,
        component: impl Component + 'static,
        options: ComponentOptions,
    ) -> Result<NodeIndex, GraphError> {
        self.insert_component(name, Arc::new(component), options)
    }

    /// Add an already shared component instance.
    pub fn insert_component(
        &mut self,
        name: impl Into<String>,
        component: Arc<dyn Component>,
        options: ComponentOptions,
    ) -> Result<NodeIndex, GraphError> {
        let name = name.into();
        if name.is_empty() || name.contains('.') {
            return Err(GraphError::InvalidName {
                reason: "names must be non-empty and must not contain '.'".to_string(),
                name,
            });
        }
        if self.index_of(&name).is_some() {
            return Err(GraphError::DuplicateName { name });
        }

        let node = Node {
            inputs: component.input_sockets(),
            outputs: component.output_sockets(),
            name,
            component,
            options,
        };
        tracing::debug!(
            component = %node.name,
            type_name = node.component.type_name(),
            loop_participating = node.options.loop_participating,
            "Component added"
        );

        self.nodes.push(node);
        self.invalidate();
        Ok(NodeIndex(self.nodes.len() - 1))
    }

    /// Remove a component and every connection touching it.
    pub fn remove_component(&mut self, name: &str) -> Result<Arc<dyn Component>, GraphError> {
        let removed = self.require(name)?;

        self.connections
            .retain(|c| c.sender != removed && c.receiver != removed);
        for connection in &mut self.connections {
            if connection.sender.0 > removed.0 {
                connection.sender.0 -= 1;
            }
            if connection.receiver.0 > removed.0 {
                connection.receiver.0 -= 1;
            }
        }

        let node = self.nodes.remove(removed.0);
        self.invalidate();
        Ok(node.component)
    }

    /// Connect `sender` (`"component.output"`) to `receiver` (`"component.input"`).
    ///
    /// The socket part may be omitted on either side when exactly one pair of
    /// type-compatible sockets exists between the two components.
    pub fn connect(&mut self, sender: &str, receiver: &str) -> Result<(), GraphError> {
        let sender_ref = SocketRef::parse(sender);
        let receiver_ref = SocketRef::parse(receiver);
        let sender_index = self.require(&sender_ref.component)?;
        let receiver_index = self.require(&receiver_ref.component)?;

        let (sender_socket, receiver_socket) =
            self.resolve_sockets(sender_index, &sender_ref, receiver_index, &receiver_ref)?;

        let sender_display = SocketRef::new(&sender_ref.component, &sender_socket).to_string();
        let receiver_display = SocketRef::new(&receiver_ref.component, &receiver_socket).to_string();

        let connection = Connection {
            sender: sender_index,
            sender_socket,
            receiver: receiver_index,
            receiver_socket,
        };

        if self.connections.contains(&connection) {
            return Err(GraphError::DuplicateConnection {
                sender: sender_display,
                receiver: receiver_display,
            });
        }

        let receiving = &self.nodes[receiver_index.0];
        let variadic = receiving
            .input(&connection.receiver_socket)
            .map(|s| s.variadic)
            .unwrap_or(false);
        if !variadic {
            if let Some(existing) = self.connections.iter().find(|c| {
                c.receiver == receiver_index && c.receiver_socket == connection.receiver_socket
            }) {
                return Err(GraphError::SocketAlreadyConnected {
                    receiver: receiver_display,
                    existing: self.describe_sender(existing),
                });
            }
        }

        ConnectionAdded {
            sender: &sender_display,
            receiver: &receiver_display,
        }
        .log();

        self.connections.push(connection);
        self.invalidate();
        Ok(())
    }

    /// Pick the socket pair for a connection, checking existence and types.
    fn resolve_sockets(
        &self,
        sender: NodeIndex,
        sender_ref: &SocketRef,
        receiver: NodeIndex,
        receiver_ref: &SocketRef,
    ) -> Result<(String, String), GraphError> {
        let sending = &self.nodes[sender.0];
        let receiving = &self.nodes[receiver.0];

        let outputs: Vec<&OutputSocket> = match &sender_ref.socket {
            Some(socket) => vec![sending.output(socket).ok_or_else(|| GraphError::UnknownSocket {
                component: sending.name.clone(),
                socket: socket.clone(),
                direction: SocketDirection::Output,
            })?],
            None => sending.outputs.iter().collect(),
        };
        let inputs: Vec<&InputSocket> = match &receiver_ref.socket {
            Some(socket) => vec![receiving.input(socket).ok_or_else(|| GraphError::UnknownSocket {
                component: receiving.name.clone(),
                socket: socket.clone(),
                direction: SocketDirection::Input,
            })?],
            None => receiving.inputs.iter().collect(),
        };

        if let (Some(_), Some(_)) = (&sender_ref.socket, &receiver_ref.socket) {
            let (output, input) = (outputs[0], inputs[0]);
            if !output.socket_type.is_compatible_with(input.connection_type()) {
                return Err(GraphError::TypeMismatch {
                    sender: sender_ref.to_string(),
                    sender_type: output.socket_type.clone(),
                    receiver: receiver_ref.to_string(),
                    receiver_type: input.connection_type().clone(),
                });
            }
            return Ok((output.name.clone(), input.name.clone()));
        }

        let candidates: Vec<(&OutputSocket, &InputSocket)> = outputs
            .iter()
            .flat_map(|output| inputs.iter().map(move |input| (*output, *input)))
            .filter(|(output, input)| output.socket_type.is_compatible_with(input.connection_type()))
            .collect();

        match candidates.as_slice() {
            [(output, input)] => Ok((output.name.clone(), input.name.clone())),
            [] => Err(GraphError::AmbiguousConnection {
                sender: sender_ref.to_string(),
                receiver: receiver_ref.to_string(),
                reason: "no type-compatible socket pair exists".to_string(),
            }),
            many => Err(GraphError::AmbiguousConnection {
                sender: sender_ref.to_string(),
                receiver: receiver_ref.to_string(),
                reason: format!(
                    "{} socket pairs are compatible ({}); name the sockets explicitly",
                    many.len(),
                    many.iter()
                        .map(|(o, i)| format!("{} -> {}", o.name, i.name))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            }),
        }
    }

    /// Structural validation: connection integrity, unintended cycles, scheduling plan.
    ///
    /// Unconnected required inputs are not errors here; they are the
    /// pipeline's open inputs (see [`Pipeline::inputs`]) and are checked
    /// against the caller's values at the start of every run.
    pub fn validate(&self) -> Result<(), Vec<GraphError>> {
        self.plan().map(|_| ())
    }

    pub(crate) fn plan(&self) -> Result<Arc<ExecutionPlan>, Vec<GraphError>> {
        self.plan
            .get_or_init(|| validate_pipeline(self).map(Arc::new))
            .clone()
    }

    fn invalidate(&mut self) {
        self.plan = OnceLock::new();
    }

    /// Open input sockets: sockets with no incoming connection, per component.
    pub fn inputs(&self) -> BTreeMap<String, Vec<InputSocket>> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| {
                let open: Vec<InputSocket> = node
                    .inputs
                    .iter()
                    .filter(|socket| {
                        !self.connections.iter().any(|c| {
                            c.receiver == NodeIndex(i) && c.receiver_socket == socket.name
                        })
                    })
                    .cloned()
                    .collect();
                (!open.is_empty()).then(|| (node.name.clone(), open))
            })
            .collect()
    }

    /// Leaf output sockets: sockets with no outgoing connection, per component.
    pub fn outputs(&self) -> BTreeMap<String, Vec<OutputSocket>> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| {
                let open: Vec<OutputSocket> = node
                    .outputs
                    .iter()
                    .filter(|socket| {
                        !self
                            .connections
                            .iter()
                            .any(|c| c.sender == NodeIndex(i) && c.sender_socket == socket.name)
                    })
                    .cloned()
                    .collect();
                (!open.is_empty()).then(|| (node.name.clone(), open))
            })
            .collect()
    }

    pub fn get_component(&self, name: &str) -> Option<&Arc<dyn Component>> {
        self.index_of(name).map(|i| &self.nodes[i.0].component)
    }

    pub fn component_options(&self, name: &str) -> Option<ComponentOptions> {
        self.index_of(name).map(|i| self.nodes[i.0].options)
    }

    /// Component names in declaration order.
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Connections in declaration order.
    pub fn connections(&self) -> Vec<ConnectionInfo> {
        self.connections
            .iter()
            .map(|c| ConnectionInfo {
                sender: SocketRef::new(&self.nodes[c.sender.0].name, &c.sender_socket),
                receiver: SocketRef::new(&self.nodes[c.receiver.0].name, &c.receiver_socket),
            })
            .collect()
    }

    pub(crate) fn index_of(&self, name: &str) -> Option<NodeIndex> {
        self.nodes.iter().position(|n| n.name == name).map(NodeIndex)
    }

    pub(crate) fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.0]
    }

    /// Effective run cap for a component.
    pub(crate) fn max_runs_for(&self, index: NodeIndex) -> usize {
        self.nodes[index.0]
            .options
            .max_runs
            .unwrap_or(self.max_runs_per_component)
            .max(1)
    }

    fn require(&self, name: &str) -> Result<NodeIndex, GraphError> {
        self.index_of(name).ok_or_else(|| GraphError::UnknownComponent {
            name: name.to_string(),
        })
    }

    fn describe_sender(&self, connection: &Connection) -> String {
        SocketRef::new(&self.nodes[connection.sender.0].name, &connection.sender_socket).to_string()
    }
}

/// Structural equality: same components (name, type, configuration, sockets,
/// options), same connections in the same order, same metadata.
impl PartialEq for Pipeline {
    fn eq(&self, other: &Self) -> bool {
        self.max_runs_per_component == other.max_runs_per_component
            && self.metadata == other.metadata
            && self.connections == other.connections
            && self.nodes.len() == other.nodes.len()
            && self.nodes.iter().zip(&other.nodes).all(|(a, b)| {
                a.name == b.name
                    && a.options == b.options
                    && a.inputs == b.inputs
                    && a.outputs == b.outputs
                    && a.component.type_name() == b.component.type_name()
                    && a.component.to_config() == b.component.to_config()
            })
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("components", &self.component_names().collect::<Vec<_>>())
            .field(
                "connections",
                &self
                    .connections()
                    .iter()
                    .map(|c| format!("{} -> {}", c.sender, c.receiver))
                    .collect::<Vec<_>>(),
            )
            .field("max_runs_per_component", &self.max_runs_per_component)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::stub::Passthrough;
    use crate::types::SocketType;

    fn text(name: &str) -> Passthrough {
        Passthrough::new(name, SocketType::Str)
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut pipeline = Pipeline::new();
        pipeline.add_component("a", text("text")).unwrap();
        let err = pipeline.add_component("a", text("text")).unwrap_err();
        assert_eq!(err, GraphError::DuplicateName { name: "a".into() });
    }

    #[test]
    fn test_dotted_or_empty_name_rejected() {
        let mut pipeline = Pipeline::new();
        for name in ["v1.embedder", ""] {
            let err = pipeline.add_component(name, text("text")).unwrap_err();
            assert!(matches!(err, GraphError::InvalidName { name: ref n, .. } if n == name));
        }
        assert!(pipeline.is_empty());

        pipeline.add_component("v1_embedder", text("text")).unwrap();
        pipeline.add_component("b", text("text")).unwrap();
        assert!(pipeline.connect("v1_embedder.text", "b.text").is_ok());
    }

    #[test]
    fn test_connect_unknown_component_and_socket() {
        let mut pipeline = Pipeline::new();
        pipeline.add_component("a", text("text")).unwrap();
        pipeline.add_component("b", text("text")).unwrap();

        assert!(matches!(
            pipeline.connect("a.text", "missing.text"),
            Err(GraphError::UnknownComponent { .. })
        ));
        assert!(matches!(
            pipeline.connect("a.nope", "b.text"),
            Err(GraphError::UnknownSocket { direction: SocketDirection::Output, .. })
        ));
        assert!(matches!(
            pipeline.connect("a.text", "b.nope"),
            Err(GraphError::UnknownSocket { direction: SocketDirection::Input, .. })
        ));
    }

    #[test]
    fn test_connect_type_mismatch() {
        let mut pipeline = Pipeline::new();
        pipeline.add_component("a", Passthrough::new("n", SocketType::Int)).unwrap();
        pipeline.add_component("b", text("text")).unwrap();
        assert!(matches!(
            pipeline.connect("a.n", "b.text"),
            Err(GraphError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_duplicate_connection_rejected() {
        let mut pipeline = Pipeline::new();
        pipeline.add_component("a", text("text")).unwrap();
        pipeline.add_component("b", text("text")).unwrap();
        pipeline.connect("a.text", "b.text").unwrap();
        assert!(matches!(
            pipeline.connect("a.text", "b.text"),
            Err(GraphError::DuplicateConnection { .. })
        ));
    }

    #[test]
    fn test_single_producer_socket_rejects_second_sender() {
        let mut pipeline = Pipeline::new();
        pipeline.add_component("a", text("text")).unwrap();
        pipeline.add_component("b", text("text")).unwrap();
        pipeline.add_component("c", text("text")).unwrap();
        pipeline.connect("a.text", "c.text").unwrap();
        let err = pipeline.connect("b.text", "c.text").unwrap_err();
        assert_eq!(
            err,
            GraphError::SocketAlreadyConnected {
                receiver: "c.text".into(),
                existing: "a.text".into()
            }
        );
    }

    #[test]
    fn test_connect_infers_unique_socket_pair() {
        let mut pipeline = Pipeline::new();
        pipeline.add_component("a", text("text")).unwrap();
        pipeline.add_component("b", text("text")).unwrap();
        pipeline.connect("a", "b").unwrap();
        let connections = pipeline.connections();
        assert_eq!(connections[0].sender, SocketRef::new("a", "text"));
        assert_eq!(connections[0].receiver, SocketRef::new("b", "text"));
    }

    #[test]
    fn test_open_inputs_and_leaf_outputs() {
        let mut pipeline = Pipeline::new();
        pipeline.add_component("a", text("text")).unwrap();
        pipeline.add_component("b", text("text")).unwrap();
        pipeline.connect("a.text", "b.text").unwrap();

        let inputs = pipeline.inputs();
        assert_eq!(inputs.keys().collect::<Vec<_>>(), vec!["a"]);
        let outputs = pipeline.outputs();
        assert_eq!(outputs.keys().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_remove_component_drops_its_connections() {
        let mut pipeline = Pipeline::new();
        pipeline.add_component("a", text("text")).unwrap();
        pipeline.add_component("b", text("text")).unwrap();
        pipeline.add_component("c", text("text")).unwrap();
        pipeline.connect("a.text", "b.text").unwrap();
        pipeline.connect("b.text", "c.text").unwrap();

        pipeline.remove_component("b").unwrap();

        assert_eq!(pipeline.component_names().collect::<Vec<_>>(), vec!["a", "c"]);
        assert!(pipeline.connections().is_empty());
        // indices were shifted, so reconnecting works on the compacted arena
        pipeline.connect("a.text", "c.text").unwrap();
        assert_eq!(pipeline.connections()[0].receiver, SocketRef::new("c", "text"));
        assert!(pipeline.validate().is_ok());
    }

    #[test]
    fn test_validation_cache_follows_topology() {
        let mut pipeline = Pipeline::new();
        pipeline.add_component("a", text("text")).unwrap();
        pipeline.add_component("b", text("text")).unwrap();
        pipeline.connect("a.text", "b.text").unwrap();
        assert!(pipeline.validate().is_ok());
        assert!(pipeline.validate().is_ok());

        pipeline.connect("b.text", "a.text").unwrap();
        assert!(pipeline.validate().is_err());
    }
}
