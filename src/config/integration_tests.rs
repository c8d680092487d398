// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::components::{BranchJoiner, Condition, ConditionalRouter, Route, RouterConfig};
use crate::components::stub::Passthrough;
use crate::config::{ComponentOptions, ComponentRegistry, Pipeline};
use crate::errors::{ConfigError, GraphError};
use crate::types::SocketType;

const LOOP_PIPELINE: &str = r#"
metadata:
  owner: search-team
max_runs_per_component: 12
components:
  - name: entry
    type: branch_joiner
    config:
      type: int
    loop_participating: true
  - name: check
    type: conditional_router
    config:
      input_type: int
      routes:
        - name: again
          condition: { op: less_than, value: 3 }
        - name: done
          condition: { op: always }
    loop_participating: true
    max_runs: 5
connections:
  - sender: entry.value
    receiver: check.value
  - sender: check.again
    receiver: entry.value
"#;

fn loop_pipeline() -> Pipeline {
    let mut pipeline = Pipeline::new().with_max_runs_per_component(12);
    pipeline
        .metadata_mut()
        .insert("owner".into(), "search-team".into());
    pipeline
        .add_component_with(
            "entry",
            BranchJoiner::new(SocketType::Int),
            ComponentOptions::looping(),
        )
        .unwrap();
    pipeline
        .add_component_with(
            "check",
            ConditionalRouter::new(
                RouterConfig::new(vec![
                    Route::new("again", Condition::less_than(None, 3)),
                    Route::new("done", Condition::Always),
                ])
                .with_input("value", SocketType::Int),
            )
            .unwrap(),
            ComponentOptions::looping().with_max_runs(5),
        )
        .unwrap();
    pipeline.connect("entry.value", "check.value").unwrap();
    pipeline.connect("check.again", "entry.value").unwrap();
    pipeline
}

/// Test that a YAML document builds the same pipeline as the builder API
#[test]
fn test_yaml_document_matches_builder() {
    let loaded = Pipeline::loads_yaml(LOOP_PIPELINE, &ComponentRegistry::default()).unwrap();
    assert_eq!(loaded, loop_pipeline());
    assert!(loaded.validate().is_ok());
    assert_eq!(
        loaded.component_options("check"),
        Some(ComponentOptions::looping().with_max_runs(5))
    );
}

/// Test that YAML and JSON round trips preserve structure and declaration order
#[test]
fn test_round_trips_preserve_structure() {
    let registry = ComponentRegistry::default();
    let pipeline = loop_pipeline();

    let yaml = pipeline.dumps_yaml().unwrap();
    assert_eq!(Pipeline::loads_yaml(&yaml, &registry).unwrap(), pipeline);

    let json = pipeline.dumps_json().unwrap();
    let from_json = Pipeline::loads_json(&json, &registry).unwrap();
    assert_eq!(from_json, pipeline);
    assert_eq!(
        from_json.component_names().collect::<Vec<_>>(),
        vec!["entry", "check"]
    );
}

/// Test saving to disk and loading back
#[test]
fn test_save_and_load_file() {
    let dir = tempfile::tempdir().unwrap();
    let registry = ComponentRegistry::default();
    let pipeline = loop_pipeline();

    for file in ["pipeline.yaml", "pipeline.json"] {
        let path = dir.path().join(file);
        pipeline.save(&path).unwrap();
        assert_eq!(Pipeline::load(&path, &registry).unwrap(), pipeline);
    }
}

/// Test that custom component types must be registered before loading
#[test]
fn test_custom_type_requires_registration() {
    let mut pipeline = Pipeline::new();
    pipeline
        .add_component("echo", Passthrough::new("text", SocketType::Str))
        .unwrap();
    let yaml = pipeline.dumps_yaml().unwrap();

    let err = Pipeline::loads_yaml(&yaml, &ComponentRegistry::default()).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownComponentType { .. }));

    let mut registry = ComponentRegistry::default();
    registry.register::<Passthrough>();
    assert_eq!(Pipeline::loads_yaml(&yaml, &registry).unwrap(), pipeline);
}

/// Test that a document with an undeclared cycle loads but fails validation
#[test]
fn test_document_with_unintended_cycle() {
    let yaml = LOOP_PIPELINE.replace("    loop_participating: true\n    max_runs: 5\n", "");
    let pipeline = Pipeline::loads_yaml(&yaml, &ComponentRegistry::default()).unwrap();
    let errors = pipeline.validate().unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, GraphError::UnintendedCycle { cycle } if cycle.contains(&"check".to_string()))));
}
