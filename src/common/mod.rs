//! Common functionality shared across the crate

pub mod config;
pub mod error;
pub mod logging;

pub use config::{Config, FailFast};
pub use error::{Error, FailureKind, Result};
