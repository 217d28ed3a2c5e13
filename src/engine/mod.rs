//! Test orchestration engine
//!
//! The stateful core: a serialized task queue per suite, an alias store and
//! run-scoped environment shared across steps, a registry of reusable
//! commands, and the runner that drives suites in order.

pub mod alias;
pub mod command;
pub mod env;
pub mod queue;
pub mod report;
pub mod runner;
pub mod step;

pub use alias::AliasStore;
pub use command::{CommandFactory, CommandRegistry};
pub use env::EnvState;
pub use queue::TaskQueue;
pub use report::{RunReport, StepReport, StepStatus, SuiteReport};
pub use runner::{RunContext, Runner};
pub use step::{StepFuture, StepHandle, StepId, StepThunk};
