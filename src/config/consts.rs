/// Default cap on invocations of one component within a single run
pub const DEFAULT_MAX_RUNS_PER_COMPONENT: usize = 100;
/// Default log filter when neither `RUST_LOG` nor the config sets one
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Overrides `max_runs_per_component`
pub const MAX_RUNS_ENV: &str = "SWITCHYARD_MAX_RUNS_PER_COMPONENT";
/// Turns span recording on or off process-wide
pub const TRACING_ENABLED_ENV: &str = "SWITCHYARD_TRACING_ENABLED";
/// Turns capture of span input/output content on or off process-wide
pub const CONTENT_TRACING_ENV: &str = "SWITCHYARD_CONTENT_TRACING_ENABLED";
/// Overrides the configured log filter
pub const LOG_FILTER_ENV: &str = "SWITCHYARD_LOG";
