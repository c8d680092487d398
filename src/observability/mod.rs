// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability: structured log messages, run tracing, and subscriber setup.
//!
//! Message types follow a struct-based pattern with `Display` and
//! [`messages::StructuredLog`] implementations so that log text lives in one
//! place and every event carries structured fields.
//!
//! # Architecture
//!
//! * `messages` - log message structs per subsystem
//! * `tracer` - span trees for pipeline runs, sinks, and the process-wide tracing policy
//! * [`init_logging`] - installs a `tracing-subscriber` fmt layer for embedding applications
//!
//! # Usage
//!
//! ```rust
//! use the_switchyard::observability::messages::component::ValueAliased;
//!
//! let msg = ValueAliased {
//!     component: "prompt_builder",
//!     socket: "template",
//!     type_name: "compiled_template",
//! };
//!
//! tracing::warn!("{}", msg);
//! ```

pub mod messages;
pub mod tracer;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::consts::DEFAULT_LOG_FILTER;
use crate::config::LoggingConfig;

/// Install a global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise the configured filter is used, and an
/// unparsable filter falls back to the default filter. Fails if a global subscriber is
/// already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(config.include_target))
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    Ok(())
}
