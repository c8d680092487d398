// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Span-based tracing of pipeline runs.
//!
//! A [`Tracer`] is a cheap, cloneable handle holding a list of [`SpanSink`]s
//! and optional per-tracer overrides of the process-wide policy. Each run
//! calls [`Tracer::begin_run`] to get its own [`RunTrace`], which owns the
//! span tree for that run only; concurrent runs never share span state.
//!
//! The engine opens one `pipeline.run` root span per run and one
//! `component.run` child span per component invocation. It never inspects
//! sinks; everything beyond span boundaries is up to the sinks.
//!
//! # Example
//!
//! ```rust
//! use the_switchyard::observability::tracer::{MemorySink, SpanOutcome, Tracer};
//!
//! let sink = MemorySink::new();
//! let tracer = Tracer::new().with_sink(sink.clone()).with_tracing_enabled(true);
//!
//! let mut trace = tracer.begin_run();
//! let root = trace.start_span("pipeline.run", None);
//! let child = trace.start_span("component.run", Some(root));
//! trace.end_span(child, SpanOutcome::Ok);
//! trace.end_span(root, SpanOutcome::Ok);
//! let tree = trace.finish().unwrap();
//!
//! assert_eq!(tree.len(), 2);
//! assert_eq!(sink.spans().len(), 2);
//! ```

mod policy;
mod sinks;
mod span;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::engine::copy_safety::copy_for;
use crate::engine::CopyWarning;
use crate::types::Value;

pub use policy::{
    disable_tracing, enable_tracing, global_tracer, is_content_tracing_enabled,
    is_tracing_enabled, reset_global_tracer, set_content_tracing, set_global_tracer,
};
pub use sinks::{LoggingSink, MemorySink, SpanSink};
pub use span::{SpanId, SpanOutcome, SpanRecord, SpanStatus, SpanTree};

#[derive(Clone, Default)]
struct TracerInner {
    sinks: Vec<Arc<dyn SpanSink>>,
    tracing_enabled: Option<bool>,
    content_tracing: Option<bool>,
}

/// Handle used to start per-run traces.
#[derive(Clone, Default)]
pub struct Tracer {
    inner: Arc<TracerInner>,
}

impl Tracer {
    /// A tracer with no sinks that follows the process-wide policy.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: impl SpanSink + 'static) -> Self {
        Arc::make_mut(&mut self.inner).sinks.push(Arc::new(sink));
        self
    }

    /// Override the process-wide tracing flag for runs using this tracer.
    pub fn with_tracing_enabled(mut self, enabled: bool) -> Self {
        Arc::make_mut(&mut self.inner).tracing_enabled = Some(enabled);
        self
    }

    /// Override the process-wide content-capture flag for runs using this tracer.
    pub fn with_content_tracing(mut self, enabled: bool) -> Self {
        Arc::make_mut(&mut self.inner).content_tracing = Some(enabled);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.tracing_enabled.unwrap_or_else(is_tracing_enabled)
    }

    pub fn captures_content(&self) -> bool {
        self.inner
            .content_tracing
            .unwrap_or_else(is_content_tracing_enabled)
    }

    /// Start the span tree for one run. Flags are sampled once here.
    pub fn begin_run(&self) -> RunTrace {
        RunTrace {
            sinks: self.inner.sinks.clone(),
            enabled: self.is_enabled(),
            content: self.captures_content(),
            next_id: 1,
            spans: Vec::new(),
            open: BTreeMap::new(),
        }
    }
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer")
            .field("sinks", &self.inner.sinks.len())
            .field("tracing_enabled", &self.inner.tracing_enabled)
            .field("content_tracing", &self.inner.content_tracing)
            .finish()
    }
}

/// Span state for a single run.
///
/// When tracing is disabled every method is a no-op and [`RunTrace::finish`]
/// returns `None`.
pub struct RunTrace {
    sinks: Vec<Arc<dyn SpanSink>>,
    enabled: bool,
    content: bool,
    next_id: u64,
    spans: Vec<SpanRecord>,
    open: BTreeMap<SpanId, (usize, Instant)>,
}

impl RunTrace {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn captures_content(&self) -> bool {
        self.enabled && self.content
    }

    pub fn start_span(&mut self, operation: &str, parent: Option<SpanId>) -> SpanId {
        let id = SpanId(self.next_id);
        self.next_id += 1;
        if !self.enabled {
            return id;
        }

        self.open.insert(id, (self.spans.len(), Instant::now()));
        self.spans.push(SpanRecord {
            id,
            parent,
            operation: operation.to_string(),
            tags: BTreeMap::new(),
            started_at: SystemTime::now(),
            duration: None,
            status: SpanStatus::Open,
            input: None,
            output: None,
        });
        id
    }

    pub fn set_tag(&mut self, id: SpanId, key: &str, value: impl ToString) {
        if let Some(span) = self.open_span(id) {
            span.tags.insert(key.to_string(), value.to_string());
        }
    }

    /// Store a copy of the span's input values when content tracing is on.
    ///
    /// Values that cannot be copied are stored by reference; each one is
    /// logged and returned as a warning attributed to the span's `component`
    /// tag, or to its operation when untagged.
    pub fn capture_input(&mut self, id: SpanId, values: &BTreeMap<String, Value>) -> Vec<CopyWarning> {
        let Some((copied, warnings)) = self.copy_content(id, values) else {
            return Vec::new();
        };
        if let Some(span) = self.open_span(id) {
            span.input = Some(copied);
        }
        warnings
    }

    /// Store a copy of the span's output values when content tracing is on.
    pub fn capture_output(&mut self, id: SpanId, values: &BTreeMap<String, Value>) -> Vec<CopyWarning> {
        let Some((copied, warnings)) = self.copy_content(id, values) else {
            return Vec::new();
        };
        if let Some(span) = self.open_span(id) {
            span.output = Some(copied);
        }
        warnings
    }

    fn copy_content(
        &mut self,
        id: SpanId,
        values: &BTreeMap<String, Value>,
    ) -> Option<(Value, Vec<CopyWarning>)> {
        if !self.captures_content() {
            return None;
        }
        let span = self.open_span(id)?;
        let owner = span
            .tags
            .get("component")
            .cloned()
            .unwrap_or_else(|| span.operation.clone());

        let mut warnings = Vec::new();
        let copied = values
            .iter()
            .map(|(socket, value)| (socket.clone(), copy_for(&owner, socket, value, &mut warnings)))
            .collect();
        Some((Value::Map(copied), warnings))
    }

    pub fn end_span(&mut self, id: SpanId, outcome: SpanOutcome) {
        let Some((position, started)) = self.open.remove(&id) else {
            return;
        };
        let span = &mut self.spans[position];
        span.duration = Some(started.elapsed());
        span.status = match outcome {
            SpanOutcome::Ok => SpanStatus::Ok,
            SpanOutcome::Error(message) => SpanStatus::Error(message),
        };
        for sink in &self.sinks {
            sink.on_span_end(span);
        }
    }

    /// Close any spans left open, notify sinks, and hand back the tree.
    pub fn finish(mut self) -> Option<SpanTree> {
        if !self.enabled {
            return None;
        }
        let still_open: Vec<SpanId> = self.open.keys().rev().copied().collect();
        for id in still_open {
            self.end_span(id, SpanOutcome::Error("span was not closed".to_string()));
        }

        let tree = SpanTree::new(self.spans);
        for sink in &self.sinks {
            sink.on_trace_end(&tree);
        }
        Some(tree)
    }

    fn open_span(&mut self, id: SpanId) -> Option<&mut SpanRecord> {
        let (position, _) = self.open.get(&id)?;
        self.spans.get_mut(*position)
    }
}
