//! Fixture loader
//!
//! Named JSON payloads loaded from the fixtures directory. The parsed
//! document is cached; every load hands out a fresh clone, so a step mutating
//! its copy never affects the source or future loads.

use std::collections::HashMap;
use std::path::PathBuf;

use serde_json::Value;

use crate::common::{Error, Result};

pub struct FixtureLoader {
    dir: PathBuf,
    cache: HashMap<String, Value>,
}

impl FixtureLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: HashMap::new(),
        }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Load `<dir>/<name>.json`, returning an independently mutable copy
    pub fn load(&mut self, name: &str) -> Result<Value> {
        if let Some(cached) = self.cache.get(name) {
            return Ok(cached.clone());
        }

        let path = self.dir.join(format!("{name}.json"));
        let content = std::fs::read_to_string(&path).map_err(|_| Error::FixtureNotFound {
            name: name.to_string(),
            dir: self.dir.display().to_string(),
        })?;
        let value: Value = serde_json::from_str(&content)?;

        self.cache.insert(name.to_string(), value.clone());
        Ok(value)
    }
}
