// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Branch joiner: merges alternative branches back into one path.
//!
//! The joiner has a single variadic input and forwards whatever value
//! arrived. It is the usual entry point of a loop: the initial value comes in
//! from outside and later values come back over a feedback edge, one per
//! iteration. Receiving more than one value in the same invocation means two
//! branches fired at once, which is an error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::{ComponentError, ConfigError};
use crate::traits::{Component, ComponentConfig, ComponentInputs, ComponentOutputs, FromConfig};
use crate::types::{InputSocket, OutputSocket, SocketType, Value};

const SOCKET: &str = "value";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct JoinerConfig {
    #[serde(rename = "type", default = "any")]
    socket_type: SocketType,
}

fn any() -> SocketType {
    SocketType::Any
}

#[derive(Debug, Clone, PartialEq)]
pub struct BranchJoiner {
    socket_type: SocketType,
}

impl BranchJoiner {
    pub fn new(socket_type: SocketType) -> Self {
        Self { socket_type }
    }
}

#[async_trait]
impl Component for BranchJoiner {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn input_sockets(&self) -> Vec<InputSocket> {
        vec![InputSocket::variadic(
            SOCKET,
            SocketType::list(self.socket_type.clone()),
        )]
    }

    fn output_sockets(&self) -> Vec<OutputSocket> {
        vec![OutputSocket::new(SOCKET, self.socket_type.clone())]
    }

    async fn run(&self, mut inputs: ComponentInputs) -> Result<ComponentOutputs, ComponentError> {
        let received = match inputs.remove(SOCKET) {
            Some(Value::List(values)) => values,
            Some(single) => vec![single],
            None => Vec::new(),
        };

        match <[Value; 1]>::try_from(received) {
            Ok([value]) => Ok(ComponentOutputs::from([(SOCKET.to_string(), value)])),
            Err(received) => Err(ComponentError::invalid_input(
                SOCKET,
                format!("expected exactly one value, received {}", received.len()),
            )),
        }
    }

    fn to_config(&self) -> ComponentConfig {
        match serde_json::to_value(JoinerConfig {
            socket_type: self.socket_type.clone(),
        }) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => ComponentConfig::new(),
        }
    }
}

impl FromConfig for BranchJoiner {
    const TYPE_NAME: &'static str = "branch_joiner";

    fn from_config(config: &ComponentConfig) -> Result<Self, ConfigError> {
        let parsed: JoinerConfig = serde_json::from_value(serde_json::Value::Object(config.clone()))
            .map_err(|e| ConfigError::InvalidComponentConfig {
                type_name: Self::TYPE_NAME.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self::new(parsed.socket_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_forwards_single_value() {
        let joiner = BranchJoiner::new(SocketType::Str);
        let inputs = ComponentInputs::from([(
            SOCKET.to_string(),
            Value::List(vec![Value::from("hello")]),
        )]);
        let outputs = joiner.run(inputs).await.unwrap();
        assert_eq!(outputs.get(SOCKET), Some(&Value::from("hello")));
    }

    #[tokio::test]
    async fn test_rejects_two_values() {
        let joiner = BranchJoiner::new(SocketType::Str);
        let inputs = ComponentInputs::from([(
            SOCKET.to_string(),
            Value::List(vec![Value::from("a"), Value::from("b")]),
        )]);
        assert!(matches!(
            joiner.run(inputs).await,
            Err(ComponentError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_sockets_and_config() {
        let joiner = BranchJoiner::new(SocketType::Int);
        let input = &joiner.input_sockets()[0];
        assert!(input.variadic);
        assert_eq!(input.connection_type(), &SocketType::Int);

        let rebuilt = BranchJoiner::from_config(&joiner.to_config()).unwrap();
        assert_eq!(rebuilt, joiner);
        assert_eq!(
            BranchJoiner::from_config(&ComponentConfig::new()).unwrap(),
            BranchJoiner::new(SocketType::Any)
        );
    }
}
