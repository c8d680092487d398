// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in control-flow components.
//!
//! * [`ConditionalRouter`] - emits on the branches whose condition holds
//! * [`BranchJoiner`] - merges alternative branches, typically as a loop entry

mod joiner;
mod router;
#[cfg(test)]
pub(crate) mod stub;

pub use joiner::BranchJoiner;
pub use router::{Condition, ConditionalRouter, Route, RouterConfig};
