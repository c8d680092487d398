// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for pipeline run lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Run start, completion and failure
//! * Components pruned from a run
//! * Quiescence handling
//! * The per-component loop cap

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A pipeline run started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_switchyard::observability::messages::engine::RunStarted;
///
/// let msg = RunStarted {
///     component_count: 5,
///     input_count: 2,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct RunStarted {
    pub component_count: usize,
    pub input_count: usize,
}

impl Display for RunStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting pipeline run: {} components, {} caller inputs",
            self.component_count, self.input_count
        )
    }
}

impl StructuredLog for RunStarted {
    fn log(&self) {
        tracing::info!(
            component_count = self.component_count,
            input_count = self.input_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "pipeline_run",
            span_name = name,
            component_count = self.component_count,
            input_count = self.input_count,
        )
    }
}

/// A pipeline run finished without error.
///
/// # Log Level
/// `info!` - Important operational event
pub struct RunCompleted {
    pub invocations: usize,
    pub skipped: usize,
    pub warnings: usize,
    pub duration: std::time::Duration,
}

impl Display for RunCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline run completed: {} invocations, {} components skipped, {} copy warnings in {:?}",
            self.invocations, self.skipped, self.warnings, self.duration
        )
    }
}

impl StructuredLog for RunCompleted {
    fn log(&self) {
        tracing::info!(
            invocations = self.invocations,
            skipped = self.skipped,
            warnings = self.warnings,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "pipeline_run_completed",
            span_name = name,
            invocations = self.invocations,
            duration = ?self.duration,
        )
    }
}

/// A pipeline run aborted.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use the_switchyard::observability::messages::engine::RunFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "boom");
/// let msg = RunFailed {
///     component: Some("generator"),
///     error: &error,
/// };
///
/// assert_eq!(msg.to_string(), "Pipeline run failed at 'generator': boom");
/// ```
pub struct RunFailed<'a> {
    pub component: Option<&'a str>,
    pub error: &'a dyn std::error::Error,
}

impl Display for RunFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.component {
            Some(component) => write!(f, "Pipeline run failed at '{}': {}", component, self.error),
            None => write!(f, "Pipeline run failed: {}", self.error),
        }
    }
}

impl StructuredLog for RunFailed<'_> {
    fn log(&self) {
        tracing::error!(
            component = self.component.unwrap_or_default(),
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "pipeline_run_failed",
            span_name = name,
            component = self.component.unwrap_or_default(),
            error = %self.error,
        )
    }
}

/// A component can no longer receive its inputs and is skipped for this run.
///
/// # Log Level
/// `debug!` - Normal outcome of routing
pub struct ComponentSkipped<'a> {
    pub component: &'a str,
}

impl Display for ComponentSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Component '{}' skipped: its inputs can no longer arrive", self.component)
    }
}

impl StructuredLog for ComponentSkipped<'_> {
    fn log(&self) {
        tracing::debug!(component = self.component, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("component_skipped", span_name = name, component = self.component)
    }
}

/// Nothing was ready; connections still pending were resolved as not traversed.
///
/// # Log Level
/// `debug!` - Scheduling detail
pub struct QuiescenceReached {
    pub resolved_connections: usize,
}

impl Display for QuiescenceReached {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "No component ready; resolved {} pending connections as not traversed",
            self.resolved_connections
        )
    }
}

impl StructuredLog for QuiescenceReached {
    fn log(&self) {
        tracing::debug!(resolved_connections = self.resolved_connections, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "quiescence",
            span_name = name,
            resolved_connections = self.resolved_connections,
        )
    }
}

/// A component became ready again after reaching its run cap.
///
/// # Log Level
/// `error!` - Aborts the run
pub struct RunawayLoopDetected<'a> {
    pub component: &'a str,
    pub max_runs: usize,
}

impl Display for RunawayLoopDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Component '{}' reached its limit of {} runs and is ready again; aborting",
            self.component, self.max_runs
        )
    }
}

impl StructuredLog for RunawayLoopDetected<'_> {
    fn log(&self) {
        tracing::error!(component = self.component, max_runs = self.max_runs, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "runaway_loop",
            span_name = name,
            component = self.component,
            max_runs = self.max_runs,
        )
    }
}
