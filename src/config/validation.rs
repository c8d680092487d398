// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Graph validation and scheduling-plan construction.
//!
//! Validation runs in three stages and accumulates every error it can find:
//!
//! 1. **Connection integrity**: every connection names existing sockets with
//!    compatible types, and single-producer sockets have at most one sender.
//! 2. **Cycle check**: strongly connected components are computed with
//!    Tarjan's algorithm. Every member of a cycle must be loop-participating;
//!    otherwise an `UnintendedCycle` error names one offending cycle path.
//! 3. **Priority**: a deterministic total order of components used to break
//!    ties between components that are ready in the same scheduling pass.
//!
//! Stage 3 only runs when stages 1 and 2 found nothing, since the priority
//! order is meaningless on a broken graph.
//!
//! # Priority Algorithm
//!
//! The strongly connected components are collapsed into a condensation DAG,
//! which is ordered with **Kahn's algorithm**. When several condensed nodes
//! are ready at once, the one containing the lowest declaration index goes
//! first. Inside a cycle, members are ordered by a depth-first walk from the
//! cycle's **entry member** (the member fed from outside the cycle, or the
//! earliest declared member when nothing outside feeds it).
//!
//! **Time Complexity**: O(V log V + E)
//!
//! # Feedback Edges
//!
//! A connection between two members of the same cycle is a *feedback edge*
//! when its sender does not come strictly before its receiver in priority
//! order. Feedback edges never block a receiver that has not run yet; they
//! only deliver values for later iterations.

use std::collections::{BTreeMap, BinaryHeap, HashSet, VecDeque};
use std::cmp::Reverse;

use crate::config::graph::{NodeIndex, Pipeline};
use crate::errors::GraphError;
use crate::observability::messages::validation::{CycleDetected, PlanComputed};
use crate::observability::messages::StructuredLog;
use crate::types::{SocketDirection, SocketRef};

/// Scheduling data derived from a validated graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    /// Rank of each node in the priority order (lower runs first).
    pub priority: Vec<usize>,
    /// Nodes sorted by priority.
    pub order: Vec<NodeIndex>,
    /// Per connection: whether it closes a loop.
    pub feedback: Vec<bool>,
    /// Per node: input socket name → incoming connection indices in declaration order.
    pub incoming: Vec<BTreeMap<String, Vec<usize>>>,
    /// Per node: outgoing connection indices in declaration order.
    pub outgoing: Vec<Vec<usize>>,
    /// Per node: whether it sits on a cycle.
    pub cyclic: Vec<bool>,
}

impl ExecutionPlan {
    pub fn is_feedback(&self, connection: usize) -> bool {
        self.feedback[connection]
    }
}

/// Validate a pipeline and compute its execution plan.
pub fn validate_pipeline(pipeline: &Pipeline) -> Result<ExecutionPlan, Vec<GraphError>> {
    let mut errors = Vec::new();

    if let Err(connection_errors) = validate_connections(pipeline) {
        errors.extend(connection_errors);
    }

    let adjacency = build_adjacency(pipeline);
    let sccs = strongly_connected_components(&adjacency);

    if let Err(cycle_errors) = validate_cycles(pipeline, &adjacency, &sccs) {
        errors.extend(cycle_errors);
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let plan = build_plan(pipeline, &adjacency, &sccs);
    PlanComputed {
        components: pipeline.len(),
        connections: pipeline.connections.len(),
        feedback_edges: plan.feedback.iter().filter(|f| **f).count(),
    }
    .log();
    Ok(plan)
}

/// Re-check every stored connection against the sockets of its endpoints.
///
/// `Pipeline::connect` already enforces these rules one connection at a time;
/// this pass catches graphs whose components changed shape after wiring.
fn validate_connections(pipeline: &Pipeline) -> Result<(), Vec<GraphError>> {
    let mut errors = Vec::new();
    let mut seen_single: HashSet<(NodeIndex, &str)> = HashSet::new();

    for connection in &pipeline.connections {
        let sender = pipeline.node(connection.sender);
        let receiver = pipeline.node(connection.receiver);

        let output = match sender.output(&connection.sender_socket) {
            Some(output) => output,
            None => {
                errors.push(GraphError::UnknownSocket {
                    component: sender.name.clone(),
                    socket: connection.sender_socket.clone(),
                    direction: SocketDirection::Output,
                });
                continue;
            }
        };
        let input = match receiver.input(&connection.receiver_socket) {
            Some(input) => input,
            None => {
                errors.push(GraphError::UnknownSocket {
                    component: receiver.name.clone(),
                    socket: connection.receiver_socket.clone(),
                    direction: SocketDirection::Input,
                });
                continue;
            }
        };

        if !output.socket_type.is_compatible_with(input.connection_type()) {
            errors.push(GraphError::TypeMismatch {
                sender: SocketRef::new(&sender.name, &output.name).to_string(),
                sender_type: output.socket_type.clone(),
                receiver: SocketRef::new(&receiver.name, &input.name).to_string(),
                receiver_type: input.connection_type().clone(),
            });
        }

        if !input.variadic && !seen_single.insert((connection.receiver, input.name.as_str())) {
            errors.push(GraphError::SocketAlreadyConnected {
                receiver: SocketRef::new(&receiver.name, &input.name).to_string(),
                existing: describe_first_sender(pipeline, connection.receiver, &input.name),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn describe_first_sender(pipeline: &Pipeline, receiver: NodeIndex, socket: &str) -> String {
    pipeline
        .connections
        .iter()
        .find(|c| c.receiver == receiver && c.receiver_socket == socket)
        .map(|c| SocketRef::new(&pipeline.node(c.sender).name, &c.sender_socket).to_string())
        .unwrap_or_default()
}

/// Successor lists in connection declaration order, without duplicates.
fn build_adjacency(pipeline: &Pipeline) -> Vec<Vec<usize>> {
    let mut adjacency = vec![Vec::new(); pipeline.len()];
    for connection in &pipeline.connections {
        let successors: &mut Vec<usize> = &mut adjacency[connection.sender.0];
        if !successors.contains(&connection.receiver.0) {
            successors.push(connection.receiver.0);
        }
    }
    adjacency
}

/// Tarjan's strongly connected components.
///
/// Returns the components together with a node → component id lookup. Each
/// component's members are sorted by declaration index.
pub(crate) fn strongly_connected_components(adjacency: &[Vec<usize>]) -> Sccs {
    struct Tarjan<'a> {
        adjacency: &'a [Vec<usize>],
        next_index: usize,
        index: Vec<Option<usize>>,
        lowlink: Vec<usize>,
        on_stack: Vec<bool>,
        stack: Vec<usize>,
        components: Vec<Vec<usize>>,
    }

    impl Tarjan<'_> {
        fn visit(&mut self, node: usize) {
            self.index[node] = Some(self.next_index);
            self.lowlink[node] = self.next_index;
            self.next_index += 1;
            self.stack.push(node);
            self.on_stack[node] = true;

            for &successor in &self.adjacency[node] {
                match self.index[successor] {
                    None => {
                        self.visit(successor);
                        self.lowlink[node] = self.lowlink[node].min(self.lowlink[successor]);
                    }
                    Some(successor_index) if self.on_stack[successor] => {
                        self.lowlink[node] = self.lowlink[node].min(successor_index);
                    }
                    Some(_) => {}
                }
            }

            if Some(self.lowlink[node]) == self.index[node] {
                let mut component = Vec::new();
                while let Some(member) = self.stack.pop() {
                    self.on_stack[member] = false;
                    component.push(member);
                    if member == node {
                        break;
                    }
                }
                component.sort_unstable();
                self.components.push(component);
            }
        }
    }

    let count = adjacency.len();
    let mut tarjan = Tarjan {
        adjacency,
        next_index: 0,
        index: vec![None; count],
        lowlink: vec![0; count],
        on_stack: vec![false; count],
        stack: Vec::new(),
        components: Vec::new(),
    };
    for node in 0..count {
        if tarjan.index[node].is_none() {
            tarjan.visit(node);
        }
    }

    let mut component_of = vec![0; count];
    for (id, members) in tarjan.components.iter().enumerate() {
        for &member in members {
            component_of[member] = id;
        }
    }
    Sccs {
        components: tarjan.components,
        component_of,
    }
}

pub(crate) struct Sccs {
    pub components: Vec<Vec<usize>>,
    pub component_of: Vec<usize>,
}

impl Sccs {
    /// Whether `node` lies on a cycle (a multi-member component or a self-loop).
    fn is_cyclic(&self, node: usize, adjacency: &[Vec<usize>]) -> bool {
        self.components[self.component_of[node]].len() > 1 || adjacency[node].contains(&node)
    }
}

/// Every member of a cycle must be loop-participating.
fn validate_cycles(
    pipeline: &Pipeline,
    adjacency: &[Vec<usize>],
    sccs: &Sccs,
) -> Result<(), Vec<GraphError>> {
    let mut errors = Vec::new();

    for members in &sccs.components {
        if !sccs.is_cyclic(members[0], adjacency) {
            continue;
        }
        let offender = members
            .iter()
            .copied()
            .find(|&m| !pipeline.node(NodeIndex(m)).options.loop_participating);
        if let Some(offender) = offender {
            let cycle: Vec<String> = cycle_through(offender, adjacency, sccs)
                .into_iter()
                .map(|n| pipeline.node(NodeIndex(n)).name.clone())
                .collect();
            CycleDetected { cycle: &cycle }.log();
            errors.push(GraphError::UnintendedCycle { cycle });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Shortest cycle path starting and ending at `start`, staying inside its component.
fn cycle_through(start: usize, adjacency: &[Vec<usize>], sccs: &Sccs) -> Vec<usize> {
    let component = sccs.component_of[start];
    let mut parent: BTreeMap<usize, usize> = BTreeMap::new();
    let mut queue = VecDeque::from([start]);

    while let Some(node) = queue.pop_front() {
        for &successor in &adjacency[node] {
            if sccs.component_of[successor] != component {
                continue;
            }
            if successor == start {
                return forward_path(start, node, &parent);
            }
            if successor != start && !parent.contains_key(&successor) {
                parent.insert(successor, node);
                queue.push_back(successor);
            }
        }
    }
    vec![start, start]
}

/// Rebuild `start -> ... -> last -> start` from BFS parent links.
fn forward_path(start: usize, last: usize, parent: &BTreeMap<usize, usize>) -> Vec<usize> {
    let mut reversed = vec![last];
    let mut cursor = last;
    while cursor != start {
        cursor = parent[&cursor];
        reversed.push(cursor);
    }
    let mut path: Vec<usize> = reversed.into_iter().rev().collect();
    path.push(start);
    path
}

fn build_plan(pipeline: &Pipeline, adjacency: &[Vec<usize>], sccs: &Sccs) -> ExecutionPlan {
    let count = pipeline.len();

    let order = priority_order(pipeline, adjacency, sccs);
    let mut priority = vec![0; count];
    for (rank, node) in order.iter().enumerate() {
        priority[node.0] = rank;
    }

    let feedback = pipeline
        .connections
        .iter()
        .map(|c| {
            sccs.component_of[c.sender.0] == sccs.component_of[c.receiver.0]
                && priority[c.sender.0] >= priority[c.receiver.0]
        })
        .collect();

    let mut incoming: Vec<BTreeMap<String, Vec<usize>>> = vec![BTreeMap::new(); count];
    let mut outgoing = vec![Vec::new(); count];
    for (index, connection) in pipeline.connections.iter().enumerate() {
        incoming[connection.receiver.0]
            .entry(connection.receiver_socket.clone())
            .or_default()
            .push(index);
        outgoing[connection.sender.0].push(index);
    }

    let cyclic = (0..count).map(|n| sccs.is_cyclic(n, adjacency)).collect();

    ExecutionPlan {
        priority,
        order,
        feedback,
        incoming,
        outgoing,
        cyclic,
    }
}

/// Kahn's algorithm over the condensation, lowest declaration index first.
fn priority_order(pipeline: &Pipeline, adjacency: &[Vec<usize>], sccs: &Sccs) -> Vec<NodeIndex> {
    let component_count = sccs.components.len();
    let mut in_degree = vec![0usize; component_count];
    let mut condensed: Vec<Vec<usize>> = vec![Vec::new(); component_count];

    for (sender, successors) in adjacency.iter().enumerate() {
        for &receiver in successors {
            let (from, to) = (sccs.component_of[sender], sccs.component_of[receiver]);
            if from != to && !condensed[from].contains(&to) {
                condensed[from].push(to);
                in_degree[to] += 1;
            }
        }
    }

    // Components are keyed by their smallest member, which is members[0].
    let mut ready: BinaryHeap<Reverse<(usize, usize)>> = (0..component_count)
        .filter(|&c| in_degree[c] == 0)
        .map(|c| Reverse((sccs.components[c][0], c)))
        .collect();

    let mut order = Vec::with_capacity(pipeline.len());
    while let Some(Reverse((_, component))) = ready.pop() {
        order.extend(order_within(component, pipeline, adjacency, sccs));
        for &next in &condensed[component] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(Reverse((sccs.components[next][0], next)));
            }
        }
    }
    order
}

/// Depth-first order of a cycle's members from its entry member.
fn order_within(
    component: usize,
    pipeline: &Pipeline,
    adjacency: &[Vec<usize>],
    sccs: &Sccs,
) -> Vec<NodeIndex> {
    let members = &sccs.components[component];
    if members.len() == 1 {
        return vec![NodeIndex(members[0])];
    }

    let entry = members
        .iter()
        .copied()
        .find(|&m| {
            pipeline.connections.iter().any(|c| {
                c.receiver.0 == m && sccs.component_of[c.sender.0] != component
            })
        })
        .unwrap_or(members[0]);

    let mut visited = HashSet::new();
    let mut postorder = Vec::with_capacity(members.len());
    dfs_postorder(entry, component, adjacency, sccs, &mut visited, &mut postorder);

    let mut order: Vec<NodeIndex> = postorder.into_iter().rev().map(NodeIndex).collect();
    // strongly connected, so every member is reachable from the entry
    debug_assert_eq!(order.len(), members.len());
    for &member in members {
        if !visited.contains(&member) {
            order.push(NodeIndex(member));
        }
    }
    order
}

fn dfs_postorder(
    node: usize,
    component: usize,
    adjacency: &[Vec<usize>],
    sccs: &Sccs,
    visited: &mut HashSet<usize>,
    postorder: &mut Vec<usize>,
) {
    visited.insert(node);
    for &successor in &adjacency[node] {
        if sccs.component_of[successor] == component && !visited.contains(&successor) {
            dfs_postorder(successor, component, adjacency, sccs, visited, postorder);
        }
    }
    postorder.push(node);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::stub::Passthrough;
    use crate::config::graph::ComponentOptions;
    use crate::types::SocketType;

    fn text() -> Passthrough {
        Passthrough::new("text", SocketType::Str)
    }

    fn names(pipeline: &Pipeline, plan: &ExecutionPlan) -> Vec<String> {
        plan.order
            .iter()
            .map(|i| pipeline.node(*i).name.clone())
            .collect()
    }

    #[test]
    fn test_linear_chain_priority_follows_edges() {
        let mut pipeline = Pipeline::new();
        pipeline.add_component("c", text()).unwrap();
        pipeline.add_component("b", text()).unwrap();
        pipeline.add_component("a", text()).unwrap();
        pipeline.connect("a.text", "b.text").unwrap();
        pipeline.connect("b.text", "c.text").unwrap();

        let plan = validate_pipeline(&pipeline).unwrap();
        assert_eq!(names(&pipeline, &plan), vec!["a", "b", "c"]);
        assert!(plan.feedback.iter().all(|f| !f));
    }

    #[test]
    fn test_independent_components_keep_declaration_order() {
        let mut pipeline = Pipeline::new();
        pipeline.add_component("second", text()).unwrap();
        pipeline.add_component("first", text()).unwrap();
        let plan = validate_pipeline(&pipeline).unwrap();
        assert_eq!(names(&pipeline, &plan), vec!["second", "first"]);
    }

    #[test]
    fn test_unintended_cycle_reports_path() {
        let mut pipeline = Pipeline::new();
        pipeline.add_component("a", text()).unwrap();
        pipeline.add_component("b", text()).unwrap();
        pipeline.connect("a.text", "b.text").unwrap();
        pipeline.connect("b.text", "a.text").unwrap();

        let errors = validate_pipeline(&pipeline).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0],
            GraphError::UnintendedCycle {
                cycle: vec!["a".into(), "b".into(), "a".into()]
            }
        );
    }

    #[test]
    fn test_cycle_with_one_unflagged_member_is_rejected() {
        let mut pipeline = Pipeline::new();
        pipeline
            .add_component_with("a", text(), ComponentOptions::looping())
            .unwrap();
        pipeline.add_component("b", text()).unwrap();
        pipeline.connect("a.text", "b.text").unwrap();
        pipeline.connect("b.text", "a.text").unwrap();

        match validate_pipeline(&pipeline).unwrap_err().as_slice() {
            [GraphError::UnintendedCycle { cycle }] => {
                assert_eq!(cycle.first().map(String::as_str), Some("b"));
                assert_eq!(cycle.last().map(String::as_str), Some("b"));
            }
            other => panic!("unexpected errors: {:?}", other),
        }
    }

    #[test]
    fn test_self_loop_needs_flag() {
        let mut pipeline = Pipeline::new();
        pipeline
            .add_component("j", crate::components::BranchJoiner::new(SocketType::Str))
            .unwrap();
        pipeline.connect("j.value", "j.value").unwrap();
        assert!(matches!(
            validate_pipeline(&pipeline).unwrap_err().as_slice(),
            [GraphError::UnintendedCycle { .. }]
        ));
    }

    #[test]
    fn test_flagged_loop_orders_from_entry_and_marks_feedback() {
        // start -> joiner -> worker -> joiner (feedback)
        let mut pipeline = Pipeline::new();
        pipeline
            .add_component_with("worker", text(), ComponentOptions::looping())
            .unwrap();
        pipeline
            .add_component_with(
                "joiner",
                crate::components::BranchJoiner::new(SocketType::Str),
                ComponentOptions::looping(),
            )
            .unwrap();
        pipeline.add_component("start", text()).unwrap();
        pipeline.connect("start.text", "joiner.value").unwrap();
        pipeline.connect("joiner.value", "worker.text").unwrap();
        pipeline.connect("worker.text", "joiner.value").unwrap();

        let plan = validate_pipeline(&pipeline).unwrap();
        assert_eq!(names(&pipeline, &plan), vec!["start", "joiner", "worker"]);
        assert_eq!(plan.feedback, vec![false, false, true]);
        assert_eq!(plan.cyclic, vec![true, true, false]);
    }

    #[test]
    fn test_sccs_found() {
        let adjacency = vec![vec![1], vec![2], vec![0, 3], vec![]];
        let sccs = strongly_connected_components(&adjacency);
        assert_eq!(sccs.components.len(), 2);
        assert_eq!(sccs.component_of[0], sccs.component_of[2]);
        assert_ne!(sccs.component_of[0], sccs.component_of[3]);
    }
}
