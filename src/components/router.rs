// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Conditional router: forwards its input on the branches whose condition holds.
//!
//! Each route is an output socket. Routes are evaluated in declaration order
//! and the first match wins, unless the router is configured with
//! `allow_multiple`, in which case every matching route fires. Branches that
//! do not fire emit nothing, so the engine prunes whatever depends only on
//! them.
//!
//! When nothing matches, the value goes to the `fallback` socket if one is
//! configured; otherwise the router fails with `ComponentError::Unroutable`.
//!
//! # Example Configuration
//!
//! ```yaml
//! components:
//!   - name: triage
//!     type: conditional_router
//!     config:
//!       input_name: ticket
//!       input_type: map
//!       routes:
//!         - name: urgent
//!           condition: { op: greater_or_equal, field: priority, value: 8 }
//!         - name: billing
//!           condition: { op: contains, field: tags, value: billing }
//!       fallback: general
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::errors::{ComponentError, ConfigError};
use crate::observability::messages::component::RouteSelected;
use crate::observability::messages::StructuredLog;
use crate::traits::{Component, ComponentConfig, ComponentInputs, ComponentOutputs, FromConfig};
use crate::types::{InputSocket, OutputSocket, SocketType, Value};

/// A predicate over a routed value.
///
/// Comparison conditions take an optional dotted `field` path into the value;
/// without one they apply to the value itself. A missing field never matches
/// a comparison and always matches `is_null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
    Always,
    Equals {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        field: Option<String>,
        value: Value,
    },
    NotEquals {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        field: Option<String>,
        value: Value,
    },
    LessThan {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        field: Option<String>,
        value: Value,
    },
    LessOrEqual {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        field: Option<String>,
        value: Value,
    },
    GreaterThan {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        field: Option<String>,
        value: Value,
    },
    GreaterOrEqual {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        field: Option<String>,
        value: Value,
    },
    Contains {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        field: Option<String>,
        value: Value,
    },
    IsNull {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        field: Option<String>,
    },
    Not {
        condition: Box<Condition>,
    },
    All {
        conditions: Vec<Condition>,
    },
    Any {
        conditions: Vec<Condition>,
    },
}

impl Condition {
    pub fn equals(field: Option<&str>, value: impl Into<Value>) -> Self {
        Condition::Equals {
            field: field.map(str::to_string),
            value: value.into(),
        }
    }

    pub fn greater_than(field: Option<&str>, value: impl Into<Value>) -> Self {
        Condition::GreaterThan {
            field: field.map(str::to_string),
            value: value.into(),
        }
    }

    pub fn less_than(field: Option<&str>, value: impl Into<Value>) -> Self {
        Condition::LessThan {
            field: field.map(str::to_string),
            value: value.into(),
        }
    }

    pub fn negate(condition: Condition) -> Self {
        Condition::Not {
            condition: Box::new(condition),
        }
    }

    pub fn evaluate(&self, input: &Value) -> bool {
        let result = match self {
            Condition::Always => true,
            Condition::Equals { field, value } => target(input, field).map(|t| t == value).unwrap_or(false),
            Condition::NotEquals { field, value } => {
                target(input, field).map(|t| t != value).unwrap_or(true)
            }
            Condition::LessThan { field, value } => ordering(input, field, value) == Some(Ordering::Less),
            Condition::LessOrEqual { field, value } => matches!(
                ordering(input, field, value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Condition::GreaterThan { field, value } => {
                ordering(input, field, value) == Some(Ordering::Greater)
            }
            Condition::GreaterOrEqual { field, value } => matches!(
                ordering(input, field, value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Condition::Contains { field, value } => target(input, field)
                .map(|t| t.contains(value))
                .unwrap_or(false),
            Condition::IsNull { field } => target(input, field).map(Value::is_null).unwrap_or(true),
            Condition::Not { condition } => !condition.evaluate(input),
            Condition::All { conditions } => conditions.iter().all(|c| c.evaluate(input)),
            Condition::Any { conditions } => conditions.iter().any(|c| c.evaluate(input)),
        };
        tracing::trace!(condition = ?self, result, "Evaluated routing condition");
        result
    }
}

fn target<'a>(input: &'a Value, field: &Option<String>) -> Option<&'a Value> {
    match field {
        Some(path) => input.get_path(path),
        None => Some(input),
    }
}

fn ordering(input: &Value, field: &Option<String>, value: &Value) -> Option<Ordering> {
    target(input, field)?.compare(value)
}

/// One output branch of a router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub name: String,
    pub condition: Condition,
    /// Declared type of the branch socket; defaults to the router's input type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_type: Option<SocketType>,
}

impl Route {
    pub fn new(name: impl Into<String>, condition: Condition) -> Self {
        Self {
            name: name.into(),
            condition,
            output_type: None,
        }
    }
}

fn default_input_name() -> String {
    "value".to_string()
}

fn default_input_type() -> SocketType {
    SocketType::Any
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default = "default_input_name")]
    pub input_name: String,
    #[serde(default = "default_input_type")]
    pub input_type: SocketType,
    pub routes: Vec<Route>,
    /// Fire every matching route instead of only the first.
    #[serde(default)]
    pub allow_multiple: bool,
    /// Output socket used when no route matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

impl RouterConfig {
    pub fn new(routes: Vec<Route>) -> Self {
        Self {
            input_name: default_input_name(),
            input_type: default_input_type(),
            routes,
            allow_multiple: false,
            fallback: None,
        }
    }

    pub fn with_input(mut self, name: impl Into<String>, socket_type: SocketType) -> Self {
        self.input_name = name.into();
        self.input_type = socket_type;
        self
    }

    pub fn with_fallback(mut self, name: impl Into<String>) -> Self {
        self.fallback = Some(name.into());
        self
    }

    pub fn allow_multiple(mut self) -> Self {
        self.allow_multiple = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalRouter {
    config: RouterConfig,
}

impl ConditionalRouter {
    /// Build a router, rejecting configurations with fewer than two branches
    /// (routes plus fallback) or with empty or repeated branch names.
    pub fn new(config: RouterConfig) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidComponentConfig {
            type_name: Self::TYPE_NAME.to_string(),
            reason,
        };

        let mut names: Vec<&str> = config.routes.iter().map(|r| r.name.as_str()).collect();
        names.extend(config.fallback.as_deref());
        if names.len() < 2 {
            return Err(invalid(format!(
                "a router needs at least two branches, found {}",
                names.len()
            )));
        }
        for (i, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(invalid("branch names must not be empty".to_string()));
            }
            if names[..i].contains(name) {
                return Err(invalid(format!("output '{}' is declared more than once", name)));
            }
        }
        Ok(Self { config })
    }

    /// Names of the branches a value is routed to.
    fn select(&self, value: &Value) -> Result<(Vec<&str>, bool), ComponentError> {
        let mut selected = Vec::new();
        for route in &self.config.routes {
            if route.condition.evaluate(value) {
                selected.push(route.name.as_str());
                if !self.config.allow_multiple {
                    break;
                }
            }
        }
        if !selected.is_empty() {
            return Ok((selected, false));
        }
        match &self.config.fallback {
            Some(fallback) => Ok((vec![fallback.as_str()], true)),
            None => Err(ComponentError::Unroutable {
                value: value.to_string(),
            }),
        }
    }
}

#[async_trait]
impl Component for ConditionalRouter {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn input_sockets(&self) -> Vec<InputSocket> {
        vec![InputSocket::required(
            &self.config.input_name,
            self.config.input_type.clone(),
        )]
    }

    fn output_sockets(&self) -> Vec<OutputSocket> {
        let mut sockets: Vec<OutputSocket> = self
            .config
            .routes
            .iter()
            .map(|route| {
                OutputSocket::new(
                    &route.name,
                    route
                        .output_type
                        .clone()
                        .unwrap_or_else(|| self.config.input_type.clone()),
                )
            })
            .collect();
        if let Some(fallback) = &self.config.fallback {
            sockets.push(OutputSocket::new(fallback, self.config.input_type.clone()));
        }
        sockets
    }

    async fn run(&self, mut inputs: ComponentInputs) -> Result<ComponentOutputs, ComponentError> {
        let value = inputs.remove(&self.config.input_name).ok_or_else(|| {
            ComponentError::invalid_input(&self.config.input_name, "no value received")
        })?;

        let (branches, fallback) = self.select(&value)?;
        RouteSelected {
            routes: &branches,
            fallback,
        }
        .log();

        Ok(branches
            .into_iter()
            .map(|branch| (branch.to_string(), value.clone()))
            .collect())
    }

    fn to_config(&self) -> ComponentConfig {
        match serde_json::to_value(&self.config) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => ComponentConfig::new(),
        }
    }
}

impl FromConfig for ConditionalRouter {
    const TYPE_NAME: &'static str = "conditional_router";

    fn from_config(config: &ComponentConfig) -> Result<Self, ConfigError> {
        let parsed: RouterConfig = serde_json::from_value(serde_json::Value::Object(config.clone()))
            .map_err(|e| ConfigError::InvalidComponentConfig {
                type_name: Self::TYPE_NAME.to_string(),
                reason: e.to_string(),
            })?;
        Self::new(parsed)
    }
}
