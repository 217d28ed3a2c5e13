//! Command registry
//!
//! Named, reusable step factories. Invoking a command enqueues one or more
//! steps onto the ambient queue and hands back the final step's handle, so a
//! suite can say "login, then use the token it published". Factories receive
//! the registry itself, letting commands invoke other commands; everything
//! flattens into the one queue in enqueue order.

use std::collections::HashMap;

use serde_json::Value;

use crate::common::{Error, Result};

use super::queue::TaskQueue;
use super::step::StepHandle;

/// A command factory: pure registration-time function from arguments to
/// enqueued steps. It performs no I/O itself.
pub type CommandFactory =
    Box<dyn Fn(&CommandRegistry, &mut TaskQueue, &Value) -> Result<StepHandle> + Send + Sync>;

/// Registry of named commands available to a suite
#[derive(Default)]
pub struct CommandRegistry {
    factories: HashMap<String, CommandFactory>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command under a name, replacing any previous definition
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&CommandRegistry, &mut TaskQueue, &Value) -> Result<StepHandle>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    /// Invoke a command, enqueueing its steps onto the given queue
    pub fn invoke(&self, queue: &mut TaskQueue, name: &str, args: &Value) -> Result<StepHandle> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| Error::UnknownCommand(name.to_string()))?;
        factory(self, queue, args)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered command names, sorted for stable output
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
