// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Pass-based, cycle-aware pipeline execution.
//!
//! # Algorithm
//!
//! Each run seeds a fresh [`RunState`] with the caller's inputs and then
//! repeats passes until nothing is ready:
//!
//! 1. **Prune**: components whose inputs can no longer arrive are marked
//!    skipped, and their outgoing connections are resolved as not traversed.
//!    This repeats to a fixpoint, so a branch a router did not take is
//!    removed as a whole.
//! 2. **Select**: every ready component is queued, ordered by the priority
//!    rank fixed at validation time.
//! 3. **Invoke**: queued components run one at a time, once each. A
//!    component that is ready after reaching its run cap aborts the run with
//!    `RunawayLoop`.
//! 4. **Deliver**: emitted values are copied along outgoing connections in
//!    declaration order. Sockets a component did not emit on are resolved as
//!    not traversed when the component cannot run again.
//!
//! When a pass finds nothing ready, every connection still pending is
//! resolved as not traversed and selection is tried once more before the run
//! ends.
//!
//! Runs are single-threaded and cooperative: the engine awaits one component
//! at a time, and any component error aborts the run immediately.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use tracing::Instrument;

use crate::config::validation::ExecutionPlan;
use crate::config::{NodeIndex, Pipeline};
use crate::engine::copy_safety::{copy_for, CopyWarning};
use crate::engine::ready_queue::{ReadyQueue, ReadyTask};
use crate::engine::state::{EdgeState, Origin, Readiness, RunState};
use crate::errors::{describe_errors, ComponentError, GraphError, PipelineRunError};
use crate::observability::messages::component::{
    ComponentCompleted, ComponentFailed, ComponentStarted, UndeclaredOutput,
};
use crate::observability::messages::engine::{
    ComponentSkipped, QuiescenceReached, RunCompleted, RunFailed, RunStarted, RunawayLoopDetected,
};
use crate::observability::messages::validation::ValidationFailed;
use crate::observability::messages::StructuredLog;
use crate::observability::tracer::{global_tracer, RunTrace, SpanId, SpanOutcome, SpanTree, Tracer};
use crate::traits::ComponentOutputs;
use crate::types::Value;

/// Caller-supplied values: component name → input socket → value.
pub type RunInputs = BTreeMap<String, BTreeMap<String, Value>>;

/// Per-run options.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Components whose every emitted output is returned, not only leaf outputs.
    pub include_outputs_from: BTreeSet<String>,
    /// Tracer for this run; the global tracer is used when `None`.
    pub tracer: Option<Tracer>,
}

impl RunOptions {
    pub fn include_outputs_from<I, S>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_outputs_from
            .extend(components.into_iter().map(Into::into));
        self
    }

    pub fn with_tracer(mut self, tracer: Tracer) -> Self {
        self.tracer = Some(tracer);
        self
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    /// Component name → output socket → value.
    pub outputs: BTreeMap<String, BTreeMap<String, Value>>,
    /// Component names in invocation order, one entry per invocation.
    pub execution_order: Vec<String>,
    /// Values passed by reference because they could not be copied.
    pub warnings: Vec<CopyWarning>,
    /// Span tree of the run, when tracing was enabled.
    pub trace: Option<SpanTree>,
}

impl PipelineOutput {
    pub fn get(&self, component: &str, socket: &str) -> Option<&Value> {
        self.outputs.get(component)?.get(socket)
    }

    /// Number of times a component ran.
    pub fn runs_of(&self, component: &str) -> usize {
        self.execution_order.iter().filter(|c| *c == component).count()
    }
}

impl Pipeline {
    /// Run the pipeline once with the given inputs.
    pub async fn run(&self, inputs: RunInputs) -> Result<PipelineOutput, PipelineRunError> {
        self.run_with(inputs, RunOptions::default()).await
    }

    pub async fn run_with(
        &self,
        inputs: RunInputs,
        options: RunOptions,
    ) -> Result<PipelineOutput, PipelineRunError> {
        let started = Instant::now();
        let plan = self.plan().map_err(invalid)?;
        self.validate_inputs(&inputs)?;

        RunStarted {
            component_count: self.len(),
            input_count: inputs.values().map(BTreeMap::len).sum(),
        }
        .log();

        let tracer = options.tracer.clone().unwrap_or_else(global_tracer);
        let mut trace = tracer.begin_run();
        let root = trace.start_span("pipeline.run", None);
        trace.set_tag(root, "components", self.len());
        trace.set_tag(root, "max_runs_per_component", self.max_runs_per_component());
        let mut state = RunState::new(self);
        if trace.captures_content() {
            let content = inputs
                .iter()
                .map(|(name, sockets)| (name.clone(), Value::Map(sockets.clone())))
                .collect();
            state.warnings.extend(trace.capture_input(root, &content));
        }

        let mut run = Run {
            pipeline: self,
            plan: plan.as_ref(),
            state,
            trace,
            root,
            include: &options.include_outputs_from,
        };
        run.seed(inputs);

        match run.execute().await {
            Ok(()) => {
                let Run {
                    mut state,
                    mut trace,
                    ..
                } = run;
                if trace.captures_content() {
                    let content = state
                        .outputs
                        .iter()
                        .map(|(name, sockets)| (name.clone(), Value::Map(sockets.clone())))
                        .collect();
                    let aliased = trace.capture_output(root, &content);
                    state.warnings.extend(aliased);
                }
                trace.end_span(root, SpanOutcome::Ok);

                RunCompleted {
                    invocations: state.execution_order.len(),
                    skipped: state.dead.iter().filter(|d| **d).count(),
                    warnings: state.warnings.len(),
                    duration: started.elapsed(),
                }
                .log();

                Ok(PipelineOutput {
                    outputs: state.outputs,
                    execution_order: state.execution_order,
                    warnings: state.warnings,
                    trace: trace.finish(),
                })
            }
            Err(error) => {
                RunFailed {
                    component: error.component(),
                    error: &error,
                }
                .log();
                let Run { mut trace, .. } = run;
                trace.end_span(root, SpanOutcome::Error(error.to_string()));
                trace.finish();
                Err(error)
            }
        }
    }

    /// Check caller inputs against the graph before anything runs.
    ///
    /// Unknown components, unknown sockets and values of the wrong type are
    /// rejected as `InvalidInput`. Required sockets with no incoming
    /// connection, no default and no caller value are reported together as
    /// `MissingInput` errors.
    pub fn validate_inputs(&self, inputs: &RunInputs) -> Result<(), PipelineRunError> {
        for (component, sockets) in inputs {
            for (socket, value) in sockets {
                let Some(index) = self.index_of(component) else {
                    return Err(invalid_input(component, socket, "no such component in this pipeline"));
                };
                let Some(input) = self.node(index).input(socket) else {
                    return Err(invalid_input(component, socket, "no such input socket"));
                };
                if !input.connection_type().accepts(value) {
                    return Err(invalid_input(
                        component,
                        socket,
                        format!(
                            "expected a value of type {}, got {}",
                            input.connection_type(),
                            value.type_label()
                        ),
                    ));
                }
            }
        }

        let mut missing = Vec::new();
        for (name, open) in self.inputs() {
            for socket in open.iter().filter(|s| s.is_required()) {
                let supplied = inputs
                    .get(&name)
                    .map(|sockets| sockets.contains_key(&socket.name))
                    .unwrap_or(false);
                if !supplied {
                    missing.push(GraphError::MissingInput {
                        component: name.clone(),
                        socket: socket.name.clone(),
                    });
                }
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(invalid(missing))
        }
    }
}

fn invalid(errors: Vec<GraphError>) -> PipelineRunError {
    let summary = describe_errors(&errors);
    ValidationFailed {
        error_count: errors.len(),
        summary: &summary,
    }
    .log();
    PipelineRunError::Invalid { errors }
}

fn invalid_input(component: &str, socket: &str, reason: impl Into<String>) -> PipelineRunError {
    PipelineRunError::InvalidInput {
        component: component.to_string(),
        socket: socket.to_string(),
        reason: reason.into(),
    }
}

/// One invocation in progress.
struct Run<'a> {
    pipeline: &'a Pipeline,
    plan: &'a ExecutionPlan,
    state: RunState,
    trace: RunTrace,
    root: SpanId,
    include: &'a BTreeSet<String>,
}

impl Run<'_> {
    fn seed(&mut self, inputs: RunInputs) {
        let pipeline = self.pipeline;
        for (component, sockets) in inputs {
            let Some(index) = pipeline.index_of(&component) else {
                continue;
            };
            let node = pipeline.node(index);
            for (socket, value) in sockets {
                let Some(input) = node.input(&socket) else {
                    continue;
                };
                let value = copy_for(&node.name, &socket, &value, &mut self.state.warnings);
                self.state.deliver(index, input, Origin::Caller, true, value);
            }
        }
    }

    async fn execute(&mut self) -> Result<(), PipelineRunError> {
        loop {
            self.prune();
            let mut queue = ReadyQueue::new();
            queue.extend(self.ready_tasks());

            if queue.is_empty() {
                let resolved = self.state.resolve_pending();
                if resolved == 0 {
                    break;
                }
                QuiescenceReached {
                    resolved_connections: resolved,
                }
                .log();
                self.prune();
                queue.extend(self.ready_tasks());
                if queue.is_empty() {
                    break;
                }
            }

            while let Some(task) = queue.pop() {
                if self.state.readiness(self.pipeline, self.plan, task.node) != Readiness::Ready {
                    continue;
                }
                self.check_run_cap(task.node)?;
                self.invoke(task.node).await?;
            }
        }
        Ok(())
    }

    fn prune(&mut self) {
        for node in self.state.propagate_dead(self.pipeline, self.plan) {
            ComponentSkipped {
                component: &self.pipeline.node(node).name,
            }
            .log();
        }
    }

    fn ready_tasks(&self) -> Vec<ReadyTask> {
        self.plan
            .order
            .iter()
            .filter(|&&node| self.state.readiness(self.pipeline, self.plan, node) == Readiness::Ready)
            .map(|&node| ReadyTask::new(node, self.plan.priority[node.0]))
            .collect()
    }

    fn check_run_cap(&self, node: NodeIndex) -> Result<(), PipelineRunError> {
        let max_runs = self.pipeline.max_runs_for(node);
        if self.state.visits[node.0] < max_runs {
            return Ok(());
        }
        let component = &self.pipeline.node(node).name;
        RunawayLoopDetected {
            component,
            max_runs,
        }
        .log();
        Err(PipelineRunError::RunawayLoop {
            component: component.clone(),
            max_runs,
            snapshot: Box::new(self.state.snapshot(self.pipeline)),
        })
    }

    async fn invoke(&mut self, index: NodeIndex) -> Result<(), PipelineRunError> {
        let pipeline = self.pipeline;
        let node = pipeline.node(index);

        let inputs = self.state.consume_inputs(index, &node.inputs);
        let visit = self.state.visits[index.0];
        self.state.execution_order.push(node.name.clone());

        let span = self.trace.start_span("component.run", Some(self.root));
        self.trace.set_tag(span, "component", &node.name);
        self.trace.set_tag(span, "type", node.component.type_name());
        self.trace.set_tag(span, "visit", visit);
        let aliased = self.trace.capture_input(span, &inputs);
        self.state.warnings.extend(aliased);

        let started_msg = ComponentStarted {
            component: &node.name,
            type_name: node.component.type_name(),
            visit,
        };
        started_msg.log();
        let started = Instant::now();
        let result = node
            .component
            .run(inputs)
            .instrument(started_msg.span("component.run"))
            .await;

        let outputs = match result {
            Ok(outputs) => outputs,
            Err(error) => {
                ComponentFailed {
                    component: &node.name,
                    error: &error,
                }
                .log();
                self.trace.end_span(span, SpanOutcome::Error(error.to_string()));
                let snapshot = Box::new(self.state.snapshot(pipeline));
                return Err(match error {
                    ComponentError::Unroutable { value } => PipelineRunError::Unroutable {
                        component: node.name.clone(),
                        value,
                        snapshot,
                    },
                    source => PipelineRunError::ComponentExecution {
                        component: node.name.clone(),
                        source,
                        snapshot,
                    },
                });
            }
        };

        let aliased = self.trace.capture_output(span, &outputs);
        self.state.warnings.extend(aliased);
        self.trace.end_span(span, SpanOutcome::Ok);

        let emitted: Vec<&str> = outputs.keys().map(String::as_str).collect();
        ComponentCompleted {
            component: &node.name,
            emitted: &emitted,
            duration: started.elapsed(),
        }
        .log();

        self.deliver(index, &outputs);
        self.collect(index, &outputs);
        Ok(())
    }

    /// Send emitted values along outgoing connections in declaration order.
    fn deliver(&mut self, index: NodeIndex, outputs: &ComponentOutputs) {
        let pipeline = self.pipeline;
        let node = pipeline.node(index);

        for socket in outputs.keys() {
            if node.output(socket).is_none() {
                UndeclaredOutput {
                    component: &node.name,
                    socket,
                }
                .log();
            }
        }

        for &c in &self.plan.outgoing[index.0] {
            let connection = &pipeline.connections[c];
            match outputs.get(&connection.sender_socket) {
                Some(value) => {
                    let receiver = pipeline.node(connection.receiver);
                    let Some(input) = receiver.input(&connection.receiver_socket) else {
                        continue;
                    };
                    let value = copy_for(&receiver.name, &input.name, value, &mut self.state.warnings);
                    // A sender outside any loop delivers once per run.
                    let persistent =
                        !self.plan.is_feedback(c) && !node.options.loop_participating;
                    self.state.deliver(
                        connection.receiver,
                        input,
                        Origin::Connection(c),
                        persistent,
                        value,
                    );
                    self.state.edges[c] = EdgeState::Traversed;
                }
                None if !node.options.loop_participating => {
                    if self.state.edges[c] == EdgeState::Pending {
                        self.state.edges[c] = EdgeState::Skipped;
                    }
                }
                None => {}
            }
        }
    }

    /// Record leaf outputs, and every output of components the caller asked for.
    fn collect(&mut self, index: NodeIndex, outputs: &ComponentOutputs) {
        let pipeline = self.pipeline;
        let node = pipeline.node(index);
        let include_all = self.include.contains(&node.name);

        for (socket, value) in outputs {
            if node.output(socket).is_none() {
                continue;
            }
            let connected = self.plan.outgoing[index.0]
                .iter()
                .any(|&c| pipeline.connections[c].sender_socket == *socket);
            if connected && !include_all {
                continue;
            }
            let value = copy_for(&node.name, socket, value, &mut self.state.warnings);
            self.state
                .outputs
                .entry(node.name.clone())
                .or_default()
                .insert(socket.clone(), value);
        }
    }
}
