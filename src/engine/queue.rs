//! Task queue
//!
//! A single suite's steps, serialized: `run` drains the queue one step at a
//! time, awaiting each thunk to settlement before the next begins. A thunk
//! may suspend internally while its HTTP call is outstanding, but no two
//! thunks are ever in flight together.

use crate::common::Error;

use super::report::{StepReport, SuiteReport};
use super::runner::RunContext;
use super::step::{Step, StepFuture, StepHandle, StepId, StepState, StepThunk};

/// FIFO queue of steps belonging to one suite
pub struct TaskQueue {
    suite: String,
    steps: Vec<Step>,
}

impl TaskQueue {
    /// Create an empty queue for the named suite
    pub fn new(suite: &str) -> Self {
        Self {
            suite: suite.to_string(),
            steps: Vec::new(),
        }
    }

    pub fn suite(&self) -> &str {
        &self.suite
    }

    /// Append a step in FIFO order relative to all prior enqueues
    ///
    /// The thunk receives the run context by exclusive borrow for exactly the
    /// duration of its own execution; the optional alias names where its
    /// result is published on success.
    pub fn enqueue<F>(&mut self, name: &str, alias: Option<&str>, thunk: F) -> StepHandle
    where
        F: for<'a> FnOnce(&'a mut RunContext) -> StepFuture<'a> + Send + 'static,
    {
        let id = StepId(self.steps.len());
        self.steps
            .push(Step::new(id, name, alias, Box::new(thunk) as StepThunk));
        StepHandle {
            id,
            alias: alias.map(str::to_string),
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Names and aliases of the queued steps, in execution order
    ///
    /// Lets callers verify command expansion and ordering without performing
    /// any I/O.
    pub fn step_names(&self) -> Vec<(String, Option<String>)> {
        self.steps
            .iter()
            .map(|s| (s.name.clone(), s.alias.clone()))
            .collect()
    }

    /// Drain the queue against the given run context
    ///
    /// Each step settles as Success or Failure; an error never propagates
    /// past the queue. With `fail_fast`, the first Failure marks every
    /// not-yet-started step as skipped.
    pub async fn run(&mut self, ctx: &mut RunContext, fail_fast: bool) -> SuiteReport {
        // Reserve alias names up front so an out-of-order read inside this
        // suite surfaces as NotYetSettled rather than UnknownAlias.
        for step in &self.steps {
            if let Some(alias) = &step.alias {
                ctx.aliases.reserve(alias);
            }
        }

        let mut reports = Vec::with_capacity(self.steps.len());
        let mut aborted = false;

        for step in &mut self.steps {
            if aborted && step.state == StepState::Pending {
                // A skipped publisher will never settle; drop its reservation
                // so later readers see UnknownAlias, not NotYetSettled.
                if let Some(alias) = &step.alias {
                    ctx.aliases.release(alias);
                }
                step.state = StepState::Skipped;
                reports.push(StepReport::skipped(&step.name, step.alias.as_deref()));
                continue;
            }

            step.state = StepState::Running;
            let settlement = match step.thunk.take() {
                Some(thunk) => thunk(ctx).await,
                None => Err(Error::Internal(format!(
                    "step '{}' was already executed",
                    step.name
                ))),
            };

            match settlement {
                Ok(value) => {
                    if let Some(alias) = &step.alias {
                        ctx.aliases.publish(alias, value);
                    }
                    step.state = StepState::Success;
                    tracing::debug!(suite = %self.suite, step = %step.name, "step settled: success");
                    reports.push(StepReport::success(&step.name, step.alias.as_deref()));
                }
                Err(error) => {
                    if let Some(alias) = &step.alias {
                        ctx.aliases.release(alias);
                    }
                    step.state = StepState::Failure;
                    tracing::warn!(suite = %self.suite, step = %step.name, %error, "step settled: failure");
                    reports.push(StepReport::failed(&step.name, step.alias.as_deref(), &error));
                    if fail_fast {
                        aborted = true;
                    }
                }
            }
        }

        SuiteReport {
            suite: self.suite.clone(),
            steps: reports,
            aborted,
        }
    }

    /// Report for a queue that never ran (whole-run fail-fast abort)
    pub(crate) fn skipped_report(&self) -> SuiteReport {
        SuiteReport {
            suite: self.suite.clone(),
            steps: self
                .steps
                .iter()
                .map(|s| StepReport::skipped(&s.name, s.alias.as_deref()))
                .collect(),
            aborted: true,
        }
    }
}
