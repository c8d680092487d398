// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for graph wiring and validation events.
//!
//! This module contains message types for logging events related to:
//! * Connections being added to a pipeline
//! * Unintended cycle detection
//! * Execution plan computation
//! * Run-input validation failures

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A connection was added to the graph.
///
/// # Log Level
/// `debug!` - Wiring detail
pub struct ConnectionAdded<'a> {
    pub sender: &'a str,
    pub receiver: &'a str,
}

impl Display for ConnectionAdded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Connected {} -> {}", self.sender, self.receiver)
    }
}

impl StructuredLog for ConnectionAdded<'_> {
    fn log(&self) {
        tracing::debug!(sender = self.sender, receiver = self.receiver, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "connection_added",
            span_name = name,
            sender = self.sender,
            receiver = self.receiver,
        )
    }
}

/// A cycle contains a component that is not loop-participating.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use the_switchyard::observability::messages::validation::CycleDetected;
///
/// let cycle = vec!["a".to_string(), "b".to_string(), "a".to_string()];
/// let msg = CycleDetected { cycle: &cycle };
///
/// assert_eq!(msg.to_string(), "Unintended cycle detected: a -> b -> a");
/// ```
pub struct CycleDetected<'a> {
    pub cycle: &'a [String],
}

impl Display for CycleDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Unintended cycle detected: {}", self.cycle.join(" -> "))
    }
}

impl StructuredLog for CycleDetected<'_> {
    fn log(&self) {
        tracing::error!(
            cycle = %self.cycle.join(" -> "),
            cycle_length = self.cycle.len().saturating_sub(1),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "cycle_detected",
            span_name = name,
            cycle = %self.cycle.join(" -> "),
        )
    }
}

/// Validation passed and a scheduling plan was computed.
///
/// # Log Level
/// `debug!` - Runs on every cache miss
pub struct PlanComputed {
    pub components: usize,
    pub connections: usize,
    pub feedback_edges: usize,
}

impl Display for PlanComputed {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline validated: {} components, {} connections, {} feedback edges",
            self.components, self.connections, self.feedback_edges
        )
    }
}

impl StructuredLog for PlanComputed {
    fn log(&self) {
        tracing::debug!(
            components = self.components,
            connections = self.connections,
            feedback_edges = self.feedback_edges,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "plan_computed",
            span_name = name,
            components = self.components,
            connections = self.connections,
            feedback_edges = self.feedback_edges,
        )
    }
}

/// Validation failed, either at build time or against run inputs.
///
/// # Log Level
/// `warn!` - The caller gets the errors back; this is the operational trail
pub struct ValidationFailed<'a> {
    pub error_count: usize,
    pub summary: &'a str,
}

impl Display for ValidationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline validation failed with {} error(s): {}",
            self.error_count, self.summary
        )
    }
}

impl StructuredLog for ValidationFailed<'_> {
    fn log(&self) {
        tracing::warn!(error_count = self.error_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "validation_failed",
            span_name = name,
            error_count = self.error_count,
        )
    }
}
