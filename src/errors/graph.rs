// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Build-time errors raised while wiring and validating a pipeline graph.
//!
//! All of these are fatal to graph construction and are never retried or
//! silently recovered.

use thiserror::Error;

use crate::types::{SocketDirection, SocketType};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("A component named '{name}' already exists in this pipeline")]
    DuplicateName { name: String },

    #[error("Invalid component name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Component '{name}' does not exist in this pipeline")]
    UnknownComponent { name: String },

    #[error("Component '{component}' has no {direction} socket named '{socket}'")]
    UnknownSocket {
        component: String,
        socket: String,
        direction: SocketDirection,
    },

    #[error(
        "Cannot connect '{sender}' ({sender_type}) to '{receiver}' ({receiver_type}): types are not compatible"
    )]
    TypeMismatch {
        sender: String,
        sender_type: SocketType,
        receiver: String,
        receiver_type: SocketType,
    },

    #[error("Connection '{sender}' -> '{receiver}' already exists")]
    DuplicateConnection { sender: String, receiver: String },

    #[error("Input socket '{receiver}' is already connected to '{existing}' and does not accept multiple connections")]
    SocketAlreadyConnected { receiver: String, existing: String },

    #[error("Cannot resolve connection '{sender}' -> '{receiver}': {reason}")]
    AmbiguousConnection {
        sender: String,
        receiver: String,
        reason: String,
    },

    #[error("Missing required input '{socket}' for component '{component}'")]
    MissingInput { component: String, socket: String },

    #[error(
        "Unintended cycle detected: {} (every component on a cycle must be loop-participating)",
        cycle.join(" -> ")
    )]
    UnintendedCycle { cycle: Vec<String> },
}

/// Join a list of graph errors into a single multi-line message.
pub fn describe_errors(errors: &[GraphError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_shows_path() {
        let err = GraphError::UnintendedCycle {
            cycle: vec!["a".into(), "b".into(), "a".into()],
        };
        assert!(err.to_string().contains("a -> b -> a"));
    }

    #[test]
    fn test_type_mismatch_message_names_both_types() {
        let err = GraphError::TypeMismatch {
            sender: "a.out".into(),
            sender_type: SocketType::Int,
            receiver: "b.in".into(),
            receiver_type: SocketType::Str,
        };
        let msg = err.to_string();
        assert!(msg.contains("'a.out' (int)"));
        assert!(msg.contains("'b.in' (str)"));
    }
}
