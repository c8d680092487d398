// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors a component may return from its `run` operation.

use std::fmt::Display;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComponentError {
    /// A routing component received a value that no branch accepts.
    #[error("no route matched value {value}")]
    Unroutable { value: String },

    #[error("invalid input '{socket}': {reason}")]
    InvalidInput { socket: String, reason: String },

    /// Any other component-specific failure.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl ComponentError {
    pub fn failed(message: impl Display) -> Self {
        ComponentError::Failed(anyhow::anyhow!("{}", message))
    }

    pub fn invalid_input(socket: impl Into<String>, reason: impl Into<String>) -> Self {
        ComponentError::InvalidInput {
            socket: socket.into(),
            reason: reason.into(),
        }
    }
}
