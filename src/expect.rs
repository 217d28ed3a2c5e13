//! Assertion evaluator
//!
//! Matchers over JSON values, evaluated against a step's result. A mismatch
//! produces an assertion error naming the path, the expectation and the
//! actual value; the task queue converts it to the owning step's Failure.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::common::{Error, Result};

/// JSON type classes for type-of checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl ValueType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::Number(_) => ValueType::Number,
            Value::String(_) => ValueType::String,
            Value::Array(_) => ValueType::Array,
            Value::Object(_) => ValueType::Object,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueType::Null => "null",
            ValueType::Bool => "boolean",
            ValueType::Number => "number",
            ValueType::String => "string",
            ValueType::Array => "array",
            ValueType::Object => "object",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValueType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "null" => Ok(ValueType::Null),
            "bool" | "boolean" => Ok(ValueType::Bool),
            "number" => Ok(ValueType::Number),
            "string" => Ok(ValueType::String),
            "array" => Ok(ValueType::Array),
            "object" => Ok(ValueType::Object),
            other => Err(Error::Config(format!("unknown value type '{other}'"))),
        }
    }
}

/// Expectation against a value at some path of a step result
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Exact equality
    Eq(Value),
    /// Structural equality of whole documents (spelled out for intent; JSON
    /// equality is structural either way)
    DeepEq(Value),
    /// The value has this JSON type
    TypeOf(ValueType),
    /// Object contains at least these fields with these values
    Includes(Map<String, Value>),
    /// Object has exactly this key set
    HasKeys(Vec<String>),
    /// Array (or string) length strictly greater than
    LenGreaterThan(usize),
    /// String contains this substring
    Contains(String),
}

impl Matcher {
    fn describe(&self) -> String {
        match self {
            Matcher::Eq(v) => format!("value equal to {}", render(v)),
            Matcher::DeepEq(v) => format!("value deep-equal to {}", render(v)),
            Matcher::TypeOf(t) => format!("a {}", t.name()),
            Matcher::Includes(fields) => {
                format!("object including {}", render(&Value::Object(fields.clone())))
            }
            Matcher::HasKeys(keys) => format!("object with exactly the keys {keys:?}"),
            Matcher::LenGreaterThan(n) => format!("length greater than {n}"),
            Matcher::Contains(s) => format!("string containing {s:?}"),
        }
    }
}

/// Evaluate a matcher against a value, failing the enclosing step on mismatch
pub fn expect(actual: &Value, path: &str, matcher: &Matcher) -> Result<()> {
    let holds = match matcher {
        Matcher::Eq(expected) | Matcher::DeepEq(expected) => actual == expected,
        Matcher::TypeOf(expected) => ValueType::of(actual) == *expected,
        Matcher::Includes(fields) => match actual.as_object() {
            Some(object) => fields.iter().all(|(k, v)| object.get(k) == Some(v)),
            None => false,
        },
        Matcher::HasKeys(keys) => match actual.as_object() {
            Some(object) => {
                object.len() == keys.len() && keys.iter().all(|k| object.contains_key(k))
            }
            None => false,
        },
        Matcher::LenGreaterThan(n) => match actual {
            Value::Array(items) => items.len() > *n,
            Value::String(s) => s.len() > *n,
            _ => false,
        },
        Matcher::Contains(needle) => actual
            .as_str()
            .map(|s| s.contains(needle))
            .unwrap_or(false),
    };

    if holds {
        Ok(())
    } else {
        Err(Error::assertion(path, matcher.describe(), render(actual)))
    }
}

/// Navigate a dot-separated path into a JSON document
///
/// Segments index objects by key and arrays by number: `body.users.0.id`.
/// An empty path addresses the document itself.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Render a value for failure messages, truncating large documents
fn render(value: &Value) -> String {
    let text = value.to_string();
    match text.char_indices().nth(200) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text,
    }
}
