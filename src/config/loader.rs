// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    CONTENT_TRACING_ENV, DEFAULT_LOG_FILTER, DEFAULT_MAX_RUNS_PER_COMPONENT, LOG_FILTER_ENV,
    MAX_RUNS_ENV, TRACING_ENABLED_ENV,
};
use crate::config::graph::Pipeline;
use crate::errors::ConfigError;
use crate::observability::tracer::{disable_tracing, enable_tracing, set_content_tracing};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Engine-wide settings.
///
/// Every field has a default, so an empty file is a valid configuration.
/// Environment variables override file values (see [`EngineConfig::with_env_overrides`]).
///
/// # Example
/// ```yaml
/// max_runs_per_component: 50
/// tracing:
///   enabled: true
///   content_tracing: false
/// logging:
///   filter: "the_switchyard=debug,info"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_runs_per_component: usize,
    pub tracing: TracingConfig,
    pub logging: LoggingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_runs_per_component: DEFAULT_MAX_RUNS_PER_COMPONENT,
            tracing: TracingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Span tracing settings, applied to the process-wide tracing policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    pub enabled: bool,
    /// Capture component input and output values in spans.
    pub content_tracing: bool,
}

/// Log subscriber settings used by `observability::init_logging`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive string; `RUST_LOG` takes precedence.
    pub filter: String,
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            include_target: true,
        }
    }
}

/// Supported configuration file formats, picked by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "json" => Ok(ConfigFormat::Json),
            "toml" => Ok(ConfigFormat::Toml),
            _ => Err(ConfigError::UnsupportedFormat { extension }),
        }
    }
}

impl EngineConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let config: EngineConfig = match format {
            ConfigFormat::Yaml if content.trim().is_empty() => EngineConfig::default(),
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
            ConfigFormat::Toml => toml::from_str(content)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply `SWITCHYARD_*` environment variables on top of this configuration.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(MAX_RUNS_ENV) {
            self.max_runs_per_component =
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidSetting {
                        key: MAX_RUNS_ENV.to_string(),
                        reason: format!("'{}' is not a positive integer", raw),
                    })?;
        }
        if let Some(raw) = lookup(TRACING_ENABLED_ENV) {
            self.tracing.enabled = parse_flag(TRACING_ENABLED_ENV, &raw)?;
        }
        if let Some(raw) = lookup(CONTENT_TRACING_ENV) {
            self.tracing.content_tracing = parse_flag(CONTENT_TRACING_ENV, &raw)?;
        }
        if let Some(filter) = lookup(LOG_FILTER_ENV) {
            self.logging.filter = filter;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_runs_per_component == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "max_runs_per_component".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Push the tracing settings into the process-wide tracing policy.
    pub fn apply_tracing_policy(&self) {
        if self.tracing.enabled {
            enable_tracing();
        } else {
            disable_tracing();
        }
        set_content_tracing(self.tracing.content_tracing);
    }

    /// An empty pipeline using this configuration's run cap.
    pub fn new_pipeline(&self) -> Pipeline {
        Pipeline::new().with_max_runs_per_component(self.max_runs_per_component)
    }
}

/// Load engine configuration from a YAML, JSON or TOML file, then apply
/// environment overrides.
pub fn load_engine_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    EngineConfig::parse(&content, format)?.with_env_overrides()
}

/// Read a boolean flag from the environment. Unset or unparsable values give `None`.
pub fn env_flag(key: &str) -> Option<bool> {
    let raw = std::env::var(key).ok()?;
    match parse_flag(key, &raw) {
        Ok(flag) => Some(flag),
        Err(error) => {
            tracing::warn!(key, error = %error, "Ignoring invalid environment flag");
            None
        }
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidSetting {
            key: key.to_string(),
            reason: format!("'{}' is not a boolean", other),
        }),
    }
}
