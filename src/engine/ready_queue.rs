// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Priority queue of components that are ready in the current pass.
//!
//! Tasks are ordered by the fixed priority rank computed at validation time,
//! lowest rank first. Ranks are unique per component, so the order is total
//! and identical across runs of an unchanged graph.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::config::NodeIndex;

/// A component waiting to be invoked in this pass.
#[derive(Debug, Clone, Copy)]
pub struct ReadyTask {
    pub node: NodeIndex,
    pub priority: usize,
}

impl ReadyTask {
    pub fn new(node: NodeIndex, priority: usize) -> Self {
        Self { node, priority }
    }
}

impl PartialEq for ReadyTask {
    /// Identity is the component; the same component cannot be queued twice.
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl Eq for ReadyTask {}

impl PartialOrd for ReadyTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReadyTask {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: reverse so the lowest rank pops first
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.node.cmp(&self.node))
    }
}

#[derive(Debug, Default)]
pub struct ReadyQueue {
    heap: BinaryHeap<ReadyTask>,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task unless its component is already queued.
    pub fn push(&mut self, task: ReadyTask) {
        if !self.contains(task.node) {
            self.heap.push(task);
        }
    }

    pub fn extend<I>(&mut self, tasks: I)
    where
        I: IntoIterator<Item = ReadyTask>,
    {
        for task in tasks {
            self.push(task);
        }
    }

    pub fn pop(&mut self) -> Option<ReadyTask> {
        self.heap.pop()
    }

    pub fn contains(&self, node: NodeIndex) -> bool {
        self.heap.iter().any(|t| t.node == node)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}
