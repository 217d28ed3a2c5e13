//! Suite compilation
//!
//! Turns a parsed suite file into a populated task queue: commands are
//! registered, steps are enqueued in file order, and environment seeds
//! become a leading step so nothing mutates shared state from outside the
//! queue. Compilation performs no I/O, which is what makes `check` mode
//! possible.

use std::path::Path;

use serde_json::{Map, Value};

use crate::common::{Error, Result};
use crate::engine::{CommandRegistry, TaskQueue};
use crate::request::RequestStep;

use super::config::{CommandSpec, RequestSpec, StepSpec, SuiteFile};

/// Read and parse a suite file
pub fn load_suite(path: &Path) -> Result<SuiteFile> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::suite_parse(&path.display().to_string(), e.to_string()))?;
    serde_yaml::from_str(&content)
        .map_err(|e| Error::suite_parse(&path.display().to_string(), e.to_string()))
}

/// Compile a suite into its task queue
pub fn compile(file: SuiteFile) -> Result<TaskQueue> {
    let mut queue = TaskQueue::new(&file.name);
    let mut registry = CommandRegistry::new();

    for (name, spec) in file.commands {
        register_command(&mut registry, &name, spec);
    }

    if !file.env.is_empty() {
        // Seeds are applied by a privileged first step, keeping every
        // mutation of shared state inside the queue.
        let mut seeds: Vec<(String, Value)> = file.env.into_iter().collect();
        seeds.sort_by(|a, b| a.0.cmp(&b.0));
        queue.enqueue("seed environment", None, move |ctx| {
            Box::pin(async move {
                for (key, value) in seeds {
                    ctx.env.set(&key, value);
                }
                Ok(Value::Null)
            })
        });
    }

    for step in file.steps {
        match step {
            StepSpec::Command { command, args } => {
                registry.invoke(&mut queue, &command, &args)?;
            }
            StepSpec::Request(spec) => {
                build_request(spec)?.enqueue(&mut queue);
            }
        }
    }

    Ok(queue)
}

fn register_command(registry: &mut CommandRegistry, name: &str, spec: CommandSpec) {
    let default_alias = name.to_string();
    registry.register(name, move |_registry, queue, _args| {
        let mut step = RequestStep::new(spec.request.method, &spec.request.path)
            .alias(spec.alias.as_deref().unwrap_or(&default_alias));
        for (header, value) in &spec.headers {
            step = step.header(header, value);
        }
        if let Some(body) = &spec.body {
            step = step.body(body.clone());
        }
        if let Some(fixture) = &spec.body_fixture {
            step = step.fixture(fixture);
        }
        for expectation in &spec.expect {
            for matcher in expectation.matchers()? {
                step = step.expect(&expectation.path, matcher);
            }
        }
        for (env_key, response_path) in &spec.save_env {
            step = step.save_env(env_key, response_path);
        }
        Ok(step.enqueue(queue))
    });
}

fn build_request(spec: RequestSpec) -> Result<RequestStep> {
    let mut step = RequestStep::new(spec.request.method, &spec.request.path);
    if let Some(name) = &spec.name {
        step = step.name(name);
    }
    for (header, value) in &spec.headers {
        step = step.header(header, value);
    }
    if let Some(body) = spec.body {
        step = step.body(body);
    }
    if let Some(fixture) = &spec.body_fixture {
        step = step.fixture(fixture);
    }
    if let Some(patch) = spec.body_patch {
        let fields: Map<String, Value> = patch.into_iter().collect();
        step = step.patch(fields);
    }
    if let Some(key) = &spec.bearer_env {
        step = step.bearer_from_env(key);
    }
    if let Some(strict) = spec.fail_on_status_code {
        step = step.fail_on_status_code(strict);
    }
    for expectation in &spec.expect {
        for matcher in expectation.matchers()? {
            step = step.expect(&expectation.path, matcher);
        }
    }
    for (env_key, response_path) in &spec.save_env {
        step = step.save_env(env_key, response_path);
    }
    if let Some(alias) = &spec.alias {
        step = step.alias(alias);
    }
    Ok(step)
}
