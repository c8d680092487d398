pub mod component;

pub use component::{
    Component, ComponentConfig, ComponentHandle, ComponentInputs, ComponentOutputs, FromConfig,
};
