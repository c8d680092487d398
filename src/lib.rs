// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! A typed, cycle-aware component graph engine.
//!
//! Components declare typed input and output sockets. A [`Pipeline`] wires
//! them together, validates the wiring (types, unintended cycles, loop flags)
//! and runs it per invocation in a deterministic priority order, with
//! routers pruning untaken branches and joiners closing loops.
//!
//! ```rust,no_run
//! use the_switchyard::{Pipeline, RunInputs};
//!
//! # async fn demo(pipeline: Pipeline) -> Result<(), the_switchyard::errors::PipelineRunError> {
//! let output = pipeline.run(RunInputs::new()).await?;
//! for (component, sockets) in &output.outputs {
//!     println!("{component}: {sockets:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod components;     // built-in router and joiner
pub mod config;         // graph, validation, documents, engine config
pub mod engine;         // pass-based executor
pub mod errors;         // error handling
pub mod observability;  // structured logs + run tracing
pub mod traits;         // component contract
pub mod types;          // sockets and runtime values

pub use config::{ComponentOptions, ComponentRegistry, EngineConfig, Pipeline};
pub use engine::{PipelineOutput, RunInputs, RunOptions};
pub use traits::{Component, ComponentInputs, ComponentOutputs, FromConfig};
pub use types::{InputSocket, OutputSocket, SocketType, Value};
