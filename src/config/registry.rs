// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Maps component type names to constructors, so pipeline documents can be
//! turned back into live components.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::components::{BranchJoiner, ConditionalRouter};
use crate::errors::ConfigError;
use crate::traits::{Component, ComponentConfig, FromConfig};

type Factory = Box<dyn Fn(&ComponentConfig) -> Result<Arc<dyn Component>, ConfigError> + Send + Sync>;

pub struct ComponentRegistry {
    factories: BTreeMap<String, Factory>,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl ComponentRegistry {
    /// A registry with no component types.
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// A registry with the built-in router and joiner.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry
            .register::<ConditionalRouter>()
            .register::<BranchJoiner>();
        registry
    }

    /// Register `T` under its `TYPE_NAME`, replacing any earlier registration.
    pub fn register<T: FromConfig>(&mut self) -> &mut Self {
        self.register_factory(T::TYPE_NAME, |config| {
            Ok(Arc::new(T::from_config(config)?) as Arc<dyn Component>)
        })
    }

    /// Register a constructor closure under an arbitrary type name.
    pub fn register_factory<F>(&mut self, type_name: &str, factory: F) -> &mut Self
    where
        F: Fn(&ComponentConfig) -> Result<Arc<dyn Component>, ConfigError> + Send + Sync + 'static,
    {
        if self
            .factories
            .insert(type_name.to_string(), Box::new(factory))
            .is_some()
        {
            tracing::debug!(type_name, "Replaced component factory");
        }
        self
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Build the component named `component` from its type name and configuration.
    pub fn build(
        &self,
        component: &str,
        type_name: &str,
        config: &ComponentConfig,
    ) -> Result<Arc<dyn Component>, ConfigError> {
        let factory =
            self.factories
                .get(type_name)
                .ok_or_else(|| ConfigError::UnknownComponentType {
                    component: component.to_string(),
                    type_name: type_name.to_string(),
                })?;

        factory(config).map_err(|source| ConfigError::ComponentConstruction {
            component: component.to_string(),
            source: Box::new(source),
        })
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("types", &self.type_names().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::stub::Passthrough;

    #[test]
    fn test_builtins_registered() {
        let registry = ComponentRegistry::default();
        assert_eq!(
            registry.type_names().collect::<Vec<_>>(),
            vec!["branch_joiner", "conditional_router"]
        );
        assert!(!registry.contains("passthrough"));
    }

    #[test]
    fn test_build_registered_type() {
        let mut registry = ComponentRegistry::empty();
        registry.register::<Passthrough>();

        let mut config = ComponentConfig::new();
        config.insert("socket".into(), "text".into());
        let component = registry.build("echo", "passthrough", &config).unwrap();
        assert_eq!(component.type_name(), "passthrough");
        assert_eq!(component.input_sockets()[0].name, "text");
    }

    #[test]
    fn test_unknown_type_names_component() {
        let registry = ComponentRegistry::empty();
        let err = registry
            .build("echo", "passthrough", &ComponentConfig::new())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            ConfigError::UnknownComponentType { ref component, .. } if component == "echo"
        ));
    }

    #[test]
    fn test_bad_config_wrapped_with_component_name() {
        let mut registry = ComponentRegistry::empty();
        registry.register::<Passthrough>();
        let err = registry
            .build("echo", "passthrough", &ComponentConfig::new())
            .err()
            .unwrap();
        assert!(err.to_string().contains("'echo'"));
        assert!(matches!(err, ConfigError::ComponentConstruction { .. }));
    }
}
