//! Suite file configuration types
//!
//! Defines the data structures for deserializing YAML suite files: request
//! steps, expectations, command definitions, and environment seeds.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::common::{Error, Result};
use crate::expect::{Matcher, ValueType};
use crate::http::Method;

/// A complete suite loaded from a YAML file
#[derive(Deserialize, Debug)]
pub struct SuiteFile {
    /// Name of the suite
    pub name: String,
    /// Optional description of what the suite verifies
    pub description: Option<String>,
    /// Values seeded into the run environment before the first step
    #[serde(default)]
    pub env: HashMap<String, Value>,
    /// Reusable commands available to this suite's steps
    #[serde(default)]
    pub commands: HashMap<String, CommandSpec>,
    /// The sequence of steps to execute
    pub steps: Vec<StepSpec>,
}

/// Method and path of a request
#[derive(Deserialize, Debug, Clone)]
pub struct RequestLine {
    pub method: Method,
    pub path: String,
}

/// A reusable command: a request template plus its expectations and captures
#[derive(Deserialize, Debug, Clone)]
pub struct CommandSpec {
    pub request: RequestLine,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
    pub body_fixture: Option<String>,
    #[serde(default)]
    pub expect: Vec<ExpectSpec>,
    #[serde(default)]
    pub save_env: HashMap<String, String>,
    /// Alias for the command's step; defaults to the command name
    pub alias: Option<String>,
}

/// One step in the execution flow
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum StepSpec {
    /// Invoke a registered command
    Command {
        command: String,
        #[serde(default)]
        args: Value,
    },
    /// Perform a request with assertions
    Request(RequestSpec),
}

/// A request step as written in a suite file
#[derive(Deserialize, Debug)]
pub struct RequestSpec {
    pub request: RequestLine,
    /// Step name for the report; defaults to "METHOD path"
    pub name: Option<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Inline JSON body; string leaves may contain `{env.*}` / `{alias.*}`
    pub body: Option<Value>,
    /// Load the body from a named fixture instead
    pub body_fixture: Option<String>,
    /// Fields shallow-merged over the body after it is built
    pub body_patch: Option<HashMap<String, Value>>,
    /// Env key holding a bearer token to send as Authorization
    pub bearer_env: Option<String>,
    /// Override the run-level non-2xx policy for this step
    pub fail_on_status_code: Option<bool>,
    #[serde(default)]
    pub expect: Vec<ExpectSpec>,
    /// Env captures: env key <- response path
    #[serde(default)]
    pub save_env: HashMap<String, String>,
    /// Publish the response under this alias
    pub alias: Option<String>,
}

/// One expectation against a response path
///
/// Exactly one of the matcher fields should be set per entry; entries with
/// several set expand to several matchers at the same path.
#[derive(Deserialize, Debug, Clone)]
pub struct ExpectSpec {
    /// Response path, e.g. `status`, `body.id`, `body.0.firstName`
    pub path: String,
    /// Exact equality
    pub equals: Option<Value>,
    /// Structural equality of whole documents
    pub deep_equals: Option<Value>,
    /// JSON type name: number, string, boolean, array, object, null
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    /// Object contains at least these fields
    pub includes: Option<HashMap<String, Value>>,
    /// Object has exactly this key set
    pub keys: Option<Vec<String>>,
    /// Array/string length strictly greater than
    pub len_gt: Option<usize>,
    /// String contains this substring
    pub contains: Option<String>,
}

impl ExpectSpec {
    /// Expand into concrete matchers
    pub fn matchers(&self) -> Result<Vec<Matcher>> {
        let mut matchers = Vec::new();
        if let Some(value) = &self.equals {
            matchers.push(Matcher::Eq(value.clone()));
        }
        if let Some(value) = &self.deep_equals {
            matchers.push(Matcher::DeepEq(value.clone()));
        }
        if let Some(name) = &self.type_name {
            matchers.push(Matcher::TypeOf(name.parse::<ValueType>()?));
        }
        if let Some(fields) = &self.includes {
            matchers.push(Matcher::Includes(
                fields.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            ));
        }
        if let Some(keys) = &self.keys {
            matchers.push(Matcher::HasKeys(keys.clone()));
        }
        if let Some(n) = self.len_gt {
            matchers.push(Matcher::LenGreaterThan(n));
        }
        if let Some(s) = &self.contains {
            matchers.push(Matcher::Contains(s.clone()));
        }
        if matchers.is_empty() {
            return Err(Error::Config(format!(
                "expectation at '{}' sets no matcher",
                self.path
            )));
        }
        Ok(matchers)
    }
}
