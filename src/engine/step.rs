//! Step types
//!
//! A step is one deferred unit of work, typically an HTTP call plus its
//! assertions. Steps are exclusively owned by the task queue until they
//! settle; terminal states are final and a step is never re-run.

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::common::Result;

use super::runner::RunContext;

/// Future produced by a step thunk; borrows the run context for its duration
pub type StepFuture<'a> = BoxFuture<'a, Result<Value>>;

/// A boxed step thunk: zero-argument beyond the ambient run context
pub type StepThunk = Box<dyn for<'a> FnOnce(&'a mut RunContext) -> StepFuture<'a> + Send>;

/// Opaque, order-assigned step identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StepId(pub(crate) usize);

impl StepId {
    /// Position of this step in its queue's enqueue order
    pub fn index(self) -> usize {
        self.0
    }
}

/// Lifecycle state of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepState {
    Pending,
    Running,
    Success,
    Failure,
    Skipped,
}

/// A queued unit of work
pub(crate) struct Step {
    pub(crate) id: StepId,
    pub(crate) name: String,
    pub(crate) alias: Option<String>,
    pub(crate) thunk: Option<StepThunk>,
    pub(crate) state: StepState,
}

impl Step {
    pub(crate) fn new(id: StepId, name: &str, alias: Option<&str>, thunk: StepThunk) -> Self {
        Self {
            id,
            name: name.to_string(),
            alias: alias.map(str::to_string),
            thunk: Some(thunk),
            state: StepState::Pending,
        }
    }
}

/// Handle returned from enqueueing a step or invoking a command
///
/// Carries the alias of the (final) step so callers can chain: invoke
/// `login`, then later resolve its published result by alias.
#[derive(Debug, Clone)]
pub struct StepHandle {
    pub id: StepId,
    pub alias: Option<String>,
}

impl StepHandle {
    /// Alias under which the step publishes its result, if any
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }
}
