// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Socket and value model shared by the graph builder and the engine.

pub mod socket;
pub mod value;

pub use socket::{InputSocket, OutputSocket, SocketDirection, SocketRef, SocketType};
pub use value::{ObjectKind, RuntimeObject, Value};
