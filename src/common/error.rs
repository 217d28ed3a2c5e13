//! Error types for the test orchestration engine
//!
//! Every error raised inside a step is caught at the step boundary and
//! recorded as that step's Failure; reports distinguish the broad kinds so
//! "could not reach the system under test" never reads like a failed
//! expectation.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the engine and CLI
#[derive(Error, Debug)]
pub enum Error {
    // === Assertion Errors ===
    #[error("assertion failed at '{path}': expected {expected}, got {actual}")]
    Assertion {
        path: String,
        expected: String,
        actual: String,
    },

    // === Step Composition Errors ===
    #[error("unknown alias '{0}'. Alias an earlier step with .alias(..) before resolving it")]
    UnknownAlias(String),

    #[error("alias '{0}' has not settled yet. A step may only read results of steps enqueued before it")]
    NotYetSettled(String),

    #[error("unknown command '{0}'. Register it before invoking")]
    UnknownCommand(String),

    #[error("unresolvable reference '{{{0}}}'")]
    BadReference(String),

    // === Environment Errors ===
    #[error("missing environment value '{0}'")]
    MissingEnvironmentValue(String),

    #[error("missing credential '{0}'. Seed it in the [credentials] config table or run a login command first")]
    MissingCredential(String),

    // === Transport Errors ===
    #[error("transport error for {method} {url}: {reason}")]
    Transport {
        method: String,
        url: String,
        reason: String,
    },

    #[error("unexpected status {status} for {method} {url}. Use fail_on_status_code = false to assert on non-2xx responses instead")]
    UnexpectedStatus {
        status: u16,
        method: String,
        url: String,
    },

    // === Fixture Errors ===
    #[error("fixture '{name}' not found in {dir}")]
    FixtureNotFound { name: String, dir: String },

    // === Configuration Errors ===
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("invalid suite file '{path}': {reason}")]
    SuiteParse { path: String, reason: String },

    // === Run Outcome ===
    #[error("{0} step(s) failed")]
    RunFailed(usize),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an assertion error from a path and a pair of rendered values
    pub fn assertion(path: &str, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::Assertion {
            path: path.to_string(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a transport error for a request that never produced a response
    pub fn transport(method: &str, url: &str, reason: impl Into<String>) -> Self {
        Self::Transport {
            method: method.to_string(),
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a suite parse error
    pub fn suite_parse(path: &str, reason: impl Into<String>) -> Self {
        Self::SuiteParse {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Broad failure classification carried by step reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The system responded but an expectation did not hold
    Assertion,
    /// Bad step composition: unknown alias, forward reference, unknown command
    Composition,
    /// A required environment value or credential was absent
    MissingValue,
    /// The HTTP collaborator failed to obtain any response
    Transport,
    /// A response arrived but with a non-2xx status under strict checking
    Status,
    /// Anything else (configuration, IO, internal)
    Other,
}

impl From<&Error> for FailureKind {
    fn from(e: &Error) -> Self {
        match e {
            Error::Assertion { .. } => FailureKind::Assertion,
            Error::UnknownAlias(_)
            | Error::NotYetSettled(_)
            | Error::UnknownCommand(_)
            | Error::BadReference(_) => FailureKind::Composition,
            Error::MissingEnvironmentValue(_) | Error::MissingCredential(_) => {
                FailureKind::MissingValue
            }
            Error::Transport { .. } => FailureKind::Transport,
            Error::UnexpectedStatus { .. } => FailureKind::Status,
            _ => FailureKind::Other,
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FailureKind::Assertion => "assertion",
            FailureKind::Composition => "composition",
            FailureKind::MissingValue => "missing-value",
            FailureKind::Transport => "transport",
            FailureKind::Status => "status",
            FailureKind::Other => "other",
        };
        f.write_str(label)
    }
}
