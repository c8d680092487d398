// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Run-time errors raised while executing a pipeline.
//!
//! Every abort names the component it originated from (where there is one)
//! and carries the partial [`RunSnapshot`] for diagnostics. The engine never
//! retries a failed run; retries belong to the caller or to a component that
//! wraps its own retry logic.

use thiserror::Error;

use crate::engine::RunSnapshot;
use crate::errors::component::ComponentError;
use crate::errors::graph::{describe_errors, GraphError};

#[derive(Debug, Error)]
pub enum PipelineRunError {
    /// The graph, or the inputs checked against it, failed validation.
    #[error("Pipeline validation failed: {}", describe_errors(errors))]
    Invalid { errors: Vec<GraphError> },

    #[error("Invalid run input for '{component}.{socket}': {reason}")]
    InvalidInput {
        component: String,
        socket: String,
        reason: String,
    },

    #[error("Component '{component}' failed: {source}")]
    ComponentExecution {
        component: String,
        #[source]
        source: ComponentError,
        snapshot: Box<RunSnapshot>,
    },

    #[error("Component '{component}' exceeded its limit of {max_runs} runs in a single invocation")]
    RunawayLoop {
        component: String,
        max_runs: usize,
        snapshot: Box<RunSnapshot>,
    },

    #[error("Router '{component}' could not route {value}: no condition matched and no fallback branch is configured")]
    Unroutable {
        component: String,
        value: String,
        snapshot: Box<RunSnapshot>,
    },
}

impl PipelineRunError {
    /// Name of the component the abort originated from.
    pub fn component(&self) -> Option<&str> {
        match self {
            PipelineRunError::ComponentExecution { component, .. }
            | PipelineRunError::RunawayLoop { component, .. }
            | PipelineRunError::Unroutable { component, .. }
            | PipelineRunError::InvalidInput { component, .. } => Some(component),
            PipelineRunError::Invalid { .. } => None,
        }
    }

    /// Partial run state at the moment of the abort.
    pub fn snapshot(&self) -> Option<&RunSnapshot> {
        match self {
            PipelineRunError::ComponentExecution { snapshot, .. }
            | PipelineRunError::RunawayLoop { snapshot, .. }
            | PipelineRunError::Unroutable { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }

    /// Validation errors, when the run was rejected before any component ran.
    pub fn graph_errors(&self) -> &[GraphError] {
        match self {
            PipelineRunError::Invalid { errors } => errors,
            _ => &[],
        }
    }
}
