// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Serialized form of a pipeline.
//!
//! A document lists components (name, type, configuration, scheduling
//! options) and connections, both in declaration order. Declaration order is
//! significant: it drives scheduling tie-breaks and variadic input ordering,
//! so a round trip must preserve it exactly.
//!
//! # Example
//! ```yaml
//! metadata:
//!   owner: search-team
//! max_runs_per_component: 20
//! components:
//!   - name: entry
//!     type: branch_joiner
//!     config:
//!       type: str
//!     loop_participating: true
//!   - name: check
//!     type: conditional_router
//!     config:
//!       routes:
//!         - name: done
//!           condition: { op: equals, value: "ok" }
//!       fallback: retry
//!     loop_participating: true
//! connections:
//!   - sender: entry.value
//!     receiver: check.value
//!   - sender: check.retry
//!     receiver: entry.value
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::config::consts::DEFAULT_MAX_RUNS_PER_COMPONENT;
use crate::config::graph::{ComponentOptions, Pipeline};
use crate::config::loader::ConfigFormat;
use crate::config::registry::ComponentRegistry;
use crate::errors::ConfigError;
use crate::traits::ComponentConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDocument {
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(default = "default_max_runs")]
    pub max_runs_per_component: usize,
    #[serde(default)]
    pub components: Vec<ComponentEntry>,
    #[serde(default)]
    pub connections: Vec<ConnectionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub config: ComponentConfig,
    #[serde(default, skip_serializing_if = "is_false")]
    pub loop_participating: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_runs: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionEntry {
    pub sender: String,
    pub receiver: String,
}

fn default_max_runs() -> usize {
    DEFAULT_MAX_RUNS_PER_COMPONENT
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl Pipeline {
    /// Snapshot the pipeline as a document. Connections always name both sockets.
    pub fn to_document(&self) -> PipelineDocument {
        PipelineDocument {
            metadata: self.metadata().clone(),
            max_runs_per_component: self.max_runs_per_component(),
            components: self
                .nodes
                .iter()
                .map(|node| ComponentEntry {
                    name: node.name.clone(),
                    type_name: node.component.type_name().to_string(),
                    config: node.component.to_config(),
                    loop_participating: node.options.loop_participating,
                    max_runs: node.options.max_runs,
                })
                .collect(),
            connections: self
                .connections()
                .into_iter()
                .map(|c| ConnectionEntry {
                    sender: c.sender.to_string(),
                    receiver: c.receiver.to_string(),
                })
                .collect(),
        }
    }

    /// Rebuild a pipeline, constructing each component through `registry`.
    ///
    /// Connections are replayed through [`Pipeline::connect`], so a document
    /// that names incompatible sockets fails the same way a manual build would.
    pub fn from_document(
        document: &PipelineDocument,
        registry: &ComponentRegistry,
    ) -> Result<Self, ConfigError> {
        if document.max_runs_per_component == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "max_runs_per_component".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if let Some(entry) = document.components.iter().find(|e| e.max_runs == Some(0)) {
            return Err(ConfigError::InvalidSetting {
                key: format!("components.{}.max_runs", entry.name),
                reason: "must be at least 1".to_string(),
            });
        }

        let mut pipeline =
            Pipeline::new().with_max_runs_per_component(document.max_runs_per_component);
        *pipeline.metadata_mut() = document.metadata.clone();

        for entry in &document.components {
            let component = registry.build(&entry.name, &entry.type_name, &entry.config)?;
            let options = ComponentOptions {
                loop_participating: entry.loop_participating,
                max_runs: entry.max_runs,
            };
            pipeline.insert_component(entry.name.clone(), component, options)?;
        }
        for connection in &document.connections {
            pipeline.connect(&connection.sender, &connection.receiver)?;
        }

        tracing::debug!(
            components = pipeline.len(),
            connections = document.connections.len(),
            "Pipeline loaded from document"
        );
        Ok(pipeline)
    }

    pub fn dumps_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(&self.to_document())?)
    }

    pub fn loads_yaml(content: &str, registry: &ComponentRegistry) -> Result<Self, ConfigError> {
        let document: PipelineDocument = serde_yaml::from_str(content)?;
        Self::from_document(&document, registry)
    }

    pub fn dumps_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }

    pub fn loads_json(content: &str, registry: &ComponentRegistry) -> Result<Self, ConfigError> {
        let document: PipelineDocument = serde_json::from_str(content)?;
        Self::from_document(&document, registry)
    }

    /// Write the pipeline to `path`, choosing YAML or JSON by extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = match ConfigFormat::from_path(path)? {
            ConfigFormat::Yaml => self.dumps_yaml()?,
            ConfigFormat::Json => self.dumps_json()?,
            ConfigFormat::Toml => {
                return Err(ConfigError::UnsupportedFormat {
                    extension: "toml".to_string(),
                })
            }
        };
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read a pipeline saved with [`Pipeline::save`].
    pub fn load<P: AsRef<Path>>(path: P, registry: &ComponentRegistry) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match format {
            ConfigFormat::Yaml => Self::loads_yaml(&content, registry),
            ConfigFormat::Json => Self::loads_json(&content, registry),
            ConfigFormat::Toml => Err(ConfigError::UnsupportedFormat {
                extension: "toml".to_string(),
            }),
        }
    }
}
