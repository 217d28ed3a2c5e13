//! Declarative suite layer
//!
//! YAML suite files compiled onto the engine: request steps, expectations,
//! aliases, env captures, and reusable command definitions.

pub mod compile;
pub mod config;

pub use compile::{compile, load_suite};
pub use config::{CommandSpec, ExpectSpec, RequestSpec, StepSpec, SuiteFile};
