// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod document;
mod graph;
mod loader;
mod registry;
pub(crate) mod validation;

#[cfg(test)]
mod integration_tests;
pub mod consts;

pub use document::{ComponentEntry, ConnectionEntry, PipelineDocument};
pub use graph::{ComponentOptions, ConnectionInfo, NodeIndex, Pipeline};
pub use loader::{
    env_flag, load_engine_config, ConfigFormat, EngineConfig, LoggingConfig, TracingConfig,
};
pub use registry::ComponentRegistry;
pub use validation::ExecutionPlan;
