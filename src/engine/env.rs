//! Run-scoped environment state
//!
//! Cross-cutting values shared by every step in a run: base URL, credentials,
//! tokens captured after login, created-entity ids. The store lives inside
//! the run context and is only ever touched from within a step's thunk, so
//! the single-running-step guarantee is the concurrency-safety mechanism.

use std::collections::HashMap;

use serde_json::Value;

use crate::common::{Error, Result};

/// Key-value store for the duration of one run
#[derive(Debug, Default)]
pub struct EnvState {
    values: HashMap<String, Value>,
}

impl EnvState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store seeded with initial values from configuration
    pub fn seeded(seeds: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            values: seeds.into_iter().collect(),
        }
    }

    /// Read a value; absent keys are signaled as `None`, not an error
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Read a value as a string, rendering non-string scalars
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.values.get(key).map(render)
    }

    /// Set a value, visible to every subsequently run step in the run
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// Read a value that the calling step's contract requires to be present
    pub fn require(&self, key: &str) -> Result<&Value> {
        self.values
            .get(key)
            .ok_or_else(|| Error::MissingEnvironmentValue(key.to_string()))
    }

    /// Like [`require`](Self::require), but for credential-class values
    pub fn require_credential(&self, key: &str) -> Result<&Value> {
        self.values
            .get(key)
            .ok_or_else(|| Error::MissingCredential(key.to_string()))
    }
}

/// Render a JSON value for interpolation into URLs and headers
pub(crate) fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
