// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod component;
mod config;
mod execution;
mod graph;

pub use component::ComponentError;
pub use config::ConfigError;
pub use execution::PipelineRunError;
pub use graph::{describe_errors, GraphError};
