// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod copy_safety;
mod executor;
pub mod ready_queue;
mod state;

pub use copy_safety::{copy_value, copy_values, Copied, CopyWarning};
pub use executor::{PipelineOutput, RunInputs, RunOptions};
pub use state::RunSnapshot;
