//! Run reporting
//!
//! Structured summaries of a drained queue, consumed by the CLI layer and by
//! tests. Every step appears with its terminal state; a run is failing if any
//! step failed.

use serde::Serialize;

use crate::common::{Error, FailureKind};

/// Terminal state of a step
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum StepStatus {
    Success,
    Failed { kind: FailureKind, message: String },
    Skipped,
}

/// One step's entry in a suite report
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub name: String,
    pub alias: Option<String>,
    #[serde(flatten)]
    pub status: StepStatus,
}

impl StepReport {
    pub(crate) fn success(name: &str, alias: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            alias: alias.map(str::to_string),
            status: StepStatus::Success,
        }
    }

    pub(crate) fn failed(name: &str, alias: Option<&str>, error: &Error) -> Self {
        Self {
            name: name.to_string(),
            alias: alias.map(str::to_string),
            status: StepStatus::Failed {
                kind: FailureKind::from(error),
                message: error.to_string(),
            },
        }
    }

    pub(crate) fn skipped(name: &str, alias: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            alias: alias.map(str::to_string),
            status: StepStatus::Skipped,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, StepStatus::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, StepStatus::Skipped)
    }
}

/// Report for one fully drained (or aborted) suite queue
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub suite: String,
    pub steps: Vec<StepReport>,
    /// True when fail-fast stopped the queue before it drained
    pub aborted: bool,
}

impl SuiteReport {
    pub fn has_failures(&self) -> bool {
        self.steps.iter().any(StepReport::is_failure)
    }

    pub fn failed_count(&self) -> usize {
        self.steps.iter().filter(|s| s.is_failure()).count()
    }
}

/// Aggregate report over every suite in the run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub suites: Vec<SuiteReport>,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        self.suites.iter().any(SuiteReport::has_failures)
    }

    pub fn total_steps(&self) -> usize {
        self.suites.iter().map(|s| s.steps.len()).sum()
    }

    pub fn failed_steps(&self) -> usize {
        self.suites.iter().map(SuiteReport::failed_count).sum()
    }

    pub fn skipped_steps(&self) -> usize {
        self.suites
            .iter()
            .flat_map(|s| &s.steps)
            .filter(|s| s.is_skipped())
            .count()
    }

    /// Process exit code: non-zero when any step failed
    pub fn exit_code(&self) -> i32 {
        if self.has_failures() {
            1
        } else {
            0
        }
    }
}
