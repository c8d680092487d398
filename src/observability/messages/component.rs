// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for component invocation events.
//!
//! This module contains message types for logging events related to:
//! * Component invocation start, completion and failure
//! * Routing decisions
//! * Copy-safety fallbacks to pass-by-reference
//! * Outputs emitted on sockets the component never declared

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A component invocation started.
///
/// # Log Level
/// `debug!` - Per-invocation detail
///
/// # Example
/// ```
/// use the_switchyard::observability::messages::component::ComponentStarted;
///
/// let msg = ComponentStarted {
///     component: "retriever",
///     type_name: "bm25_retriever",
///     visit: 1,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct ComponentStarted<'a> {
    pub component: &'a str,
    pub type_name: &'a str,
    pub visit: usize,
}

impl Display for ComponentStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Running component '{}' ({}), visit {}",
            self.component, self.type_name, self.visit
        )
    }
}

impl StructuredLog for ComponentStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            component = self.component,
            type_name = self.type_name,
            visit = self.visit,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "component",
            span_name = name,
            component = self.component,
            type_name = self.type_name,
            visit = self.visit,
        )
    }
}

/// A component invocation returned.
///
/// # Log Level
/// `debug!` - Per-invocation detail
pub struct ComponentCompleted<'a> {
    pub component: &'a str,
    pub emitted: &'a [&'a str],
    pub duration: std::time::Duration,
}

impl Display for ComponentCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Component '{}' completed in {:?}, emitted [{}]",
            self.component,
            self.duration,
            self.emitted.join(", ")
        )
    }
}

impl StructuredLog for ComponentCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            component = self.component,
            emitted = %self.emitted.join(","),
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "component_completed",
            span_name = name,
            component = self.component,
            duration = ?self.duration,
        )
    }
}

/// A component invocation returned an error.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ComponentFailed<'a> {
    pub component: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ComponentFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Component '{}' failed: {}", self.component, self.error)
    }
}

impl StructuredLog for ComponentFailed<'_> {
    fn log(&self) {
        tracing::error!(component = self.component, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "component_failed",
            span_name = name,
            component = self.component,
            error = %self.error,
        )
    }
}

/// A router chose its branches for one input value.
///
/// # Log Level
/// `debug!` - Routing detail
pub struct RouteSelected<'a> {
    pub routes: &'a [&'a str],
    pub fallback: bool,
}

impl Display for RouteSelected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.fallback {
            write!(f, "No route matched; using fallback '{}'", self.routes.join(", "))
        } else {
            write!(f, "Routing to [{}]", self.routes.join(", "))
        }
    }
}

impl StructuredLog for RouteSelected<'_> {
    fn log(&self) {
        tracing::debug!(
            routes = %self.routes.join(","),
            fallback = self.fallback,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "route_selected",
            span_name = name,
            routes = %self.routes.join(","),
            fallback = self.fallback,
        )
    }
}

/// A value could not be deep-copied and is shared by reference instead.
///
/// # Log Level
/// `warn!` - Degraded but non-fatal
///
/// # Example
/// ```
/// use the_switchyard::observability::messages::component::ValueAliased;
///
/// let msg = ValueAliased {
///     component: "prompt_builder",
///     socket: "template",
///     type_name: "compiled_template",
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct ValueAliased<'a> {
    pub component: &'a str,
    pub socket: &'a str,
    pub type_name: &'a str,
}

impl Display for ValueAliased<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Value of type '{}' for '{}.{}' could not be copied; passing the original by reference",
            self.type_name, self.component, self.socket
        )
    }
}

impl StructuredLog for ValueAliased<'_> {
    fn log(&self) {
        tracing::warn!(
            component = self.component,
            socket = self.socket,
            type_name = self.type_name,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "value_aliased",
            span_name = name,
            component = self.component,
            socket = self.socket,
            type_name = self.type_name,
        )
    }
}

/// A component emitted a value on a socket it does not declare.
///
/// # Log Level
/// `warn!` - The value is dropped
pub struct UndeclaredOutput<'a> {
    pub component: &'a str,
    pub socket: &'a str,
}

impl Display for UndeclaredOutput<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Component '{}' emitted undeclared output '{}'; ignoring it",
            self.component, self.socket
        )
    }
}

impl StructuredLog for UndeclaredOutput<'_> {
    fn log(&self) {
        tracing::warn!(component = self.component, socket = self.socket, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "undeclared_output",
            span_name = name,
            component = self.component,
            socket = self.socket,
        )
    }
}
