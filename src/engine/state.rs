// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-run scheduling state.
//!
//! A [`RunState`] is created for every invocation and never shared. It holds
//! the socket buffers, visit counts, and the traversal mask that records, for
//! every connection, whether its sender has delivered on it (`Traversed`),
//! will never deliver on it (`Skipped`), or may still deliver (`Pending`).

use std::collections::BTreeMap;

use crate::config::validation::ExecutionPlan;
use crate::config::{NodeIndex, Pipeline};
use crate::engine::copy_safety::CopyWarning;
use crate::types::{InputSocket, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EdgeState {
    Pending,
    Traversed,
    Skipped,
}

/// Where a buffered value came from. Caller values sort before connection
/// values, and connection values sort by declaration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Origin {
    Caller,
    Connection(usize),
}

#[derive(Debug, Clone)]
pub(crate) struct Buffered {
    pub origin: Origin,
    /// Survives consumption on single-value sockets. Set for caller values and
    /// for values whose sender cannot run again in this invocation.
    pub persistent: bool,
    pub value: Value,
}

/// Scheduling verdict for one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Readiness {
    Ready,
    /// An input may still arrive.
    Waiting,
    /// Ran already and has no fresh input, or can never be satisfied again.
    Done,
    /// Never ran and never will in this invocation.
    Dead,
}

enum SocketStatus {
    Satisfied,
    Waiting,
    Unreachable,
}

pub(crate) struct RunState {
    pub edges: Vec<EdgeState>,
    buffers: Vec<BTreeMap<String, Vec<Buffered>>>,
    pub visits: Vec<usize>,
    fresh: Vec<bool>,
    pub dead: Vec<bool>,
    pub execution_order: Vec<String>,
    pub outputs: BTreeMap<String, BTreeMap<String, Value>>,
    pub warnings: Vec<CopyWarning>,
}

impl RunState {
    pub fn new(pipeline: &Pipeline) -> Self {
        let count = pipeline.len();
        Self {
            edges: vec![EdgeState::Pending; pipeline.connections.len()],
            buffers: vec![BTreeMap::new(); count],
            visits: vec![0; count],
            fresh: vec![false; count],
            dead: vec![false; count],
            execution_order: Vec::new(),
            outputs: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Buffer a value for `node.socket`.
    ///
    /// Single-value sockets keep only the latest value; variadic sockets keep
    /// one value per origin, ordered by origin.
    pub fn deliver(
        &mut self,
        node: NodeIndex,
        socket: &InputSocket,
        origin: Origin,
        persistent: bool,
        value: Value,
    ) {
        let slot = self.buffers[node.0].entry(socket.name.clone()).or_default();
        let buffered = Buffered {
            origin,
            persistent,
            value,
        };
        if socket.variadic {
            slot.retain(|b| b.origin != origin);
            let position = slot.partition_point(|b| b.origin < origin);
            slot.insert(position, buffered);
        } else {
            slot.clear();
            slot.push(buffered);
        }
        if origin != Origin::Caller {
            self.fresh[node.0] = true;
        }
    }

    /// Take the values a component runs with.
    ///
    /// Persistent values on single-value sockets stay buffered so a looping
    /// component sees them on every iteration; everything else is consumed.
    /// Sockets with nothing buffered fall back to their default.
    pub fn consume_inputs(&mut self, node: NodeIndex, sockets: &[InputSocket]) -> BTreeMap<String, Value> {
        let mut inputs = BTreeMap::new();
        for socket in sockets {
            let buffered = self.buffers[node.0].get_mut(&socket.name);
            let value = match buffered {
                Some(slot) if !slot.is_empty() => {
                    if socket.variadic {
                        let values = slot.drain(..).map(|b| b.value).collect();
                        Some(Value::List(values))
                    } else {
                        let latest = slot.last().map(|b| b.value.clone());
                        slot.retain(|b| b.persistent);
                        latest
                    }
                }
                _ => socket.default.clone(),
            };
            if let Some(value) = value {
                inputs.insert(socket.name.clone(), value);
            }
        }
        self.visits[node.0] += 1;
        self.fresh[node.0] = false;
        inputs
    }

    fn has_buffered(&self, node: NodeIndex, socket: &str) -> bool {
        self.buffers[node.0]
            .get(socket)
            .map(|slot| !slot.is_empty())
            .unwrap_or(false)
    }

    fn has_any_buffered(&self, node: NodeIndex) -> bool {
        self.buffers[node.0].values().any(|slot| !slot.is_empty())
    }

    pub fn readiness(&self, pipeline: &Pipeline, plan: &ExecutionPlan, node: NodeIndex) -> Readiness {
        if self.dead[node.0] {
            return Readiness::Dead;
        }
        let component = pipeline.node(node);
        let visits = self.visits[node.0];
        if visits > 0 && !(component.options.loop_participating && self.fresh[node.0]) {
            return Readiness::Done;
        }

        let incoming = &plan.incoming[node.0];
        if visits == 0
            && !incoming.is_empty()
            && incoming
                .values()
                .flatten()
                .all(|&c| self.edges[c] == EdgeState::Skipped)
            && !self.has_any_buffered(node)
        {
            return Readiness::Dead;
        }

        for socket in &component.inputs {
            match self.socket_status(pipeline, plan, node, socket) {
                SocketStatus::Satisfied => {}
                SocketStatus::Waiting => return Readiness::Waiting,
                SocketStatus::Unreachable if visits == 0 => return Readiness::Dead,
                SocketStatus::Unreachable => return Readiness::Done,
            }
        }
        Readiness::Ready
    }

    fn socket_status(
        &self,
        pipeline: &Pipeline,
        plan: &ExecutionPlan,
        node: NodeIndex,
        socket: &InputSocket,
    ) -> SocketStatus {
        let connections = plan
            .incoming[node.0]
            .get(&socket.name)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let has_value = self.has_buffered(node, &socket.name);

        let blocked = connections
            .iter()
            .any(|&c| self.edges[c] == EdgeState::Pending && !plan.is_feedback(c));
        if blocked && (socket.variadic || !has_value) {
            return SocketStatus::Waiting;
        }
        if has_value || socket.default.is_some() {
            return SocketStatus::Satisfied;
        }

        // Required and empty: can anything still deliver?
        let may_deliver = connections.iter().any(|&c| {
            let sender = pipeline.connections[c].sender;
            self.edges[c] != EdgeState::Skipped
                && (plan.is_feedback(c) || pipeline.node(sender).options.loop_participating)
                && !self.dead[sender.0]
        });
        if may_deliver {
            SocketStatus::Waiting
        } else {
            SocketStatus::Unreachable
        }
    }

    /// Mark components that can no longer run as dead and skip their outgoing
    /// connections, repeating until nothing changes. Returns the newly dead
    /// components in declaration order.
    pub fn propagate_dead(&mut self, pipeline: &Pipeline, plan: &ExecutionPlan) -> Vec<NodeIndex> {
        let mut newly_dead = Vec::new();
        loop {
            let mut changed = false;
            for index in 0..pipeline.len() {
                let node = NodeIndex(index);
                if self.dead[index] || self.visits[index] > 0 {
                    continue;
                }
                if self.readiness(pipeline, plan, node) == Readiness::Dead {
                    self.dead[index] = true;
                    for &c in &plan.outgoing[index] {
                        if self.edges[c] == EdgeState::Pending {
                            self.edges[c] = EdgeState::Skipped;
                        }
                    }
                    newly_dead.push(node);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        newly_dead.sort();
        newly_dead
    }

    /// Resolve every still-pending connection as not traversed.
    pub fn resolve_pending(&mut self) -> usize {
        let mut resolved = 0;
        for edge in &mut self.edges {
            if *edge == EdgeState::Pending {
                *edge = EdgeState::Skipped;
                resolved += 1;
            }
        }
        resolved
    }

    pub fn snapshot(&self, pipeline: &Pipeline) -> RunSnapshot {
        let name = |i: usize| pipeline.node(NodeIndex(i)).name.clone();
        RunSnapshot {
            execution_order: self.execution_order.clone(),
            visits: self
                .visits
                .iter()
                .enumerate()
                .map(|(i, v)| (name(i), *v))
                .collect(),
            pending_inputs: self
                .buffers
                .iter()
                .enumerate()
                .filter_map(|(i, sockets)| {
                    let pending: BTreeMap<String, Value> = sockets
                        .iter()
                        .filter(|(_, slot)| !slot.is_empty())
                        .map(|(socket, slot)| {
                            let value = match slot.as_slice() {
                                [single] => single.value.clone(),
                                many => Value::List(many.iter().map(|b| b.value.clone()).collect()),
                            };
                            (socket.clone(), value)
                        })
                        .collect();
                    (!pending.is_empty()).then(|| (name(i), pending))
                })
                .collect(),
            outputs: self.outputs.clone(),
            skipped: self
                .dead
                .iter()
                .enumerate()
                .filter(|(_, dead)| **dead)
                .map(|(i, _)| name(i))
                .collect(),
        }
    }
}

/// Partial run state captured when a run aborts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSnapshot {
    /// Component names in invocation order, one entry per invocation.
    pub execution_order: Vec<String>,
    pub visits: BTreeMap<String, usize>,
    /// Values delivered but not yet consumed, per component and socket.
    pub pending_inputs: BTreeMap<String, BTreeMap<String, Value>>,
    /// Outputs collected before the abort.
    pub outputs: BTreeMap<String, BTreeMap<String, Value>>,
    /// Components pruned from the run.
    pub skipped: Vec<String>,
}

impl RunSnapshot {
    pub fn visits_of(&self, component: &str) -> usize {
        self.visits.get(component).copied().unwrap_or_default()
    }
}
