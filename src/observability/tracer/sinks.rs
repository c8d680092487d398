// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Subscribers to span completion.

use std::sync::{Arc, Mutex};

use crate::observability::tracer::span::{SpanRecord, SpanStatus, SpanTree};

/// Receives finished spans. Implementations must be cheap; they run inline
/// on the run's thread of control.
pub trait SpanSink: Send + Sync {
    fn on_span_end(&self, span: &SpanRecord);

    /// Called once per run with the complete tree.
    fn on_trace_end(&self, _tree: &SpanTree) {}
}

/// Emits every finished span as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

impl SpanSink for LoggingSink {
    fn on_span_end(&self, span: &SpanRecord) {
        let duration_us = span.duration.map(|d| d.as_micros() as u64).unwrap_or_default();
        let tags = span
            .tags
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ");
        match &span.status {
            SpanStatus::Error(message) => tracing::warn!(
                span_id = span.id.0,
                parent_id = ?span.parent.map(|p| p.0),
                operation = %span.operation,
                duration_us,
                error = %message,
                "span {} failed [{}]",
                span.operation,
                tags
            ),
            _ => tracing::debug!(
                span_id = span.id.0,
                parent_id = ?span.parent.map(|p| p.0),
                operation = %span.operation,
                duration_us,
                "span {} finished [{}]",
                span.operation,
                tags
            ),
        }
    }
}

/// Collects finished spans and trees in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    spans: Arc<Mutex<Vec<SpanRecord>>>,
    trees: Arc<Mutex<Vec<SpanTree>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spans(&self) -> Vec<SpanRecord> {
        self.spans.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn trees(&self) -> Vec<SpanTree> {
        self.trees.lock().map(|t| t.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut spans) = self.spans.lock() {
            spans.clear();
        }
        if let Ok(mut trees) = self.trees.lock() {
            trees.clear();
        }
    }
}

impl SpanSink for MemorySink {
    fn on_span_end(&self, span: &SpanRecord) {
        if let Ok(mut spans) = self.spans.lock() {
            spans.push(span.clone());
        }
    }

    fn on_trace_end(&self, tree: &SpanTree) {
        if let Ok(mut trees) = self.trees.lock() {
            trees.push(tree.clone());
        }
    }
}
