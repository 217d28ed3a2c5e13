//! apiflow - stateful orchestration for HTTP API test suites
//!
//! Steps run strictly one at a time in enqueue order; results are published
//! under aliases for later steps, cross-cutting values (tokens, ids) live in
//! a run-scoped environment, and reusable commands compose into the same
//! serialized queue.

pub mod cli;
pub mod commands;
pub mod common;
pub mod engine;
pub mod expect;
pub mod fixture;
pub mod http;
pub mod request;
pub mod suite;

// Re-export commonly used types for tests and programmatic suites
pub use common::{Config, Error, FailFast, FailureKind, Result};
pub use engine::{
    AliasStore, CommandRegistry, EnvState, RunContext, RunReport, Runner, StepHandle, TaskQueue,
};
pub use expect::{expect, Matcher, ValueType};
pub use fixture::FixtureLoader;
pub use http::{HttpClient, HttpRequest, HttpResponse, Method, ReqwestClient};
pub use request::RequestStep;
