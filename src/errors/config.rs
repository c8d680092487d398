// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors for loading engine configuration and (de)serializing pipelines.

use std::path::PathBuf;
use thiserror::Error;

use crate::errors::graph::GraphError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access '{}': {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported configuration format '{extension}' (expected yaml, yml, json or toml)")]
    UnsupportedFormat { extension: String },

    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("Unknown component type '{type_name}' for component '{component}'")]
    UnknownComponentType { component: String, type_name: String },

    #[error("Invalid configuration for component type '{type_name}': {reason}")]
    InvalidComponentConfig { type_name: String, reason: String },

    #[error("Failed to build component '{component}': {source}")]
    ComponentConstruction {
        component: String,
        #[source]
        source: Box<ConfigError>,
    },

    #[error("Invalid pipeline document: {0}")]
    Graph(#[from] GraphError),
}
