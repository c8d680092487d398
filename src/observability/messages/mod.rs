// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message is a small struct borrowing the data it reports. It implements
//! `Display` for the human-readable line and [`StructuredLog`] to emit itself
//! through `tracing` at the right level with structured fields attached.
//!
//! # Organization
//!
//! * `engine` - run lifecycle, pruning, loop cap
//! * `component` - component invocations, routing decisions, copy-safety warnings
//! * `validation` - graph wiring and validation events
//!
//! # Usage Pattern
//!
//! ```rust
//! use the_switchyard::observability::messages::engine::RunStarted;
//! use the_switchyard::observability::messages::StructuredLog;
//!
//! RunStarted {
//!     component_count: 5,
//!     input_count: 2,
//! }
//! .log();
//! ```

pub mod component;
pub mod engine;
pub mod validation;

use tracing::Span;

/// A message that knows its own log level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a `tracing` event.
    fn log(&self);

    /// Open a `tracing` span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
