// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Process-wide tracing policy and the global tracer.
//!
//! Both flags are read from the environment the first time any policy
//! function is called and can be changed at runtime afterwards:
//!
//! * `SWITCHYARD_TRACING_ENABLED` - record spans at all (default off)
//! * `SWITCHYARD_CONTENT_TRACING_ENABLED` - capture input/output values in spans (default off)
//!
//! A `Tracer` passed explicitly through `RunOptions` may override either flag
//! for a single run; the global tracer is only used when none is passed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Once, OnceLock, RwLock};

use crate::config::consts::{CONTENT_TRACING_ENV, TRACING_ENABLED_ENV};
use crate::config::env_flag;
use crate::observability::tracer::sinks::LoggingSink;
use crate::observability::tracer::Tracer;

static INIT: Once = Once::new();
static TRACING_ENABLED: AtomicBool = AtomicBool::new(false);
static CONTENT_TRACING: AtomicBool = AtomicBool::new(false);
static GLOBAL_TRACER: OnceLock<RwLock<Tracer>> = OnceLock::new();

fn ensure_initialized() {
    INIT.call_once(|| {
        if let Some(enabled) = env_flag(TRACING_ENABLED_ENV) {
            TRACING_ENABLED.store(enabled, Ordering::SeqCst);
        }
        if let Some(enabled) = env_flag(CONTENT_TRACING_ENV) {
            CONTENT_TRACING.store(enabled, Ordering::SeqCst);
        }
    });
}

pub fn enable_tracing() {
    ensure_initialized();
    TRACING_ENABLED.store(true, Ordering::SeqCst);
}

pub fn disable_tracing() {
    ensure_initialized();
    TRACING_ENABLED.store(false, Ordering::SeqCst);
}

pub fn is_tracing_enabled() -> bool {
    ensure_initialized();
    TRACING_ENABLED.load(Ordering::SeqCst)
}

pub fn set_content_tracing(enabled: bool) {
    ensure_initialized();
    CONTENT_TRACING.store(enabled, Ordering::SeqCst);
}

pub fn is_content_tracing_enabled() -> bool {
    ensure_initialized();
    CONTENT_TRACING.load(Ordering::SeqCst)
}

fn global() -> &'static RwLock<Tracer> {
    GLOBAL_TRACER.get_or_init(|| RwLock::new(Tracer::new().with_sink(LoggingSink)))
}

/// Replace the tracer used by runs that do not pass their own.
pub fn set_global_tracer(tracer: Tracer) {
    let mut guard = global().write().unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = tracer;
}

pub fn global_tracer() -> Tracer {
    global()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// Restore the default global tracer (a single `LoggingSink`).
pub fn reset_global_tracer() {
    set_global_tracer(Tracer::new().with_sink(LoggingSink));
}
