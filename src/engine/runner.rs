//! Run context and multi-suite runner
//!
//! The run context is the one place shared mutable state lives: environment
//! values, aliases, the HTTP collaborator and the fixture loader. It is
//! passed into each thunk by exclusive borrow, which makes the "only one
//! step runs at a time" guarantee structural rather than a convention.

use std::sync::Arc;

use crate::common::{Config, FailFast};
use crate::fixture::FixtureLoader;
use crate::http::HttpClient;

use super::alias::AliasStore;
use super::env::EnvState;
use super::queue::TaskQueue;
use super::report::RunReport;

/// Shared state for the duration of one run
pub struct RunContext {
    pub env: EnvState,
    pub aliases: AliasStore,
    pub http: Arc<dyn HttpClient>,
    pub fixtures: FixtureLoader,
    /// Default for steps that do not set their own status leniency
    pub strict_status: bool,
}

impl RunContext {
    pub fn new(env: EnvState, http: Arc<dyn HttpClient>, fixtures: FixtureLoader) -> Self {
        Self {
            env,
            aliases: AliasStore::new(),
            http,
            fixtures,
            strict_status: true,
        }
    }
}

/// Executes suites sequentially against one run context
///
/// Each suite's queue fully drains (or hits a fail-fast abort) before the
/// next suite begins; suites never interleave. Environment state persists
/// across suites, which is how a one-time login serves many specs.
pub struct Runner {
    ctx: RunContext,
    fail_fast: FailFast,
}

impl Runner {
    /// Build a runner from configuration and an HTTP collaborator
    pub fn new(config: &Config, http: Arc<dyn HttpClient>) -> Self {
        let env = EnvState::seeded(config.seed_values());
        let fixtures = FixtureLoader::new(&config.fixtures_dir);
        let mut ctx = RunContext::new(env, http, fixtures);
        ctx.strict_status = config.fail_on_status_code;
        Self {
            ctx,
            fail_fast: config.fail_fast,
        }
    }

    /// Build a runner from an existing context (programmatic use and tests)
    pub fn from_context(ctx: RunContext, fail_fast: FailFast) -> Self {
        Self { ctx, fail_fast }
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut RunContext {
        &mut self.ctx
    }

    /// Run every suite in order and aggregate the reports
    pub async fn run(&mut self, suites: Vec<TaskQueue>) -> RunReport {
        let mut reports = Vec::with_capacity(suites.len());
        let mut abort_run = false;

        for mut queue in suites {
            if abort_run {
                tracing::info!(suite = %queue.suite(), "suite skipped by run-level fail-fast");
                reports.push(queue.skipped_report());
                continue;
            }

            tracing::info!(suite = %queue.suite(), steps = queue.len(), "suite starting");
            let fail_fast = self.fail_fast != FailFast::Off;
            let report = queue.run(&mut self.ctx, fail_fast).await;
            if report.has_failures() && self.fail_fast == FailFast::Run {
                abort_run = true;
            }
            reports.push(report);
        }

        RunReport { suites: reports }
    }
}

/// Context against a panicking HTTP stub, for engine tests that never touch
/// the network.
#[cfg(test)]
pub(crate) fn test_context() -> RunContext {
    use crate::http::{HttpRequest, HttpResponse};
    use async_trait::async_trait;

    struct NoHttp;

    #[async_trait]
    impl HttpClient for NoHttp {
        async fn send(&self, req: HttpRequest) -> crate::common::Result<HttpResponse> {
            panic!("unexpected HTTP call in engine test: {} {}", req.method, req.url);
        }
    }

    RunContext::new(
        EnvState::new(),
        Arc::new(NoHttp),
        FixtureLoader::new("fixtures"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn suite_with(names: &[&str], fail_at: Option<&str>) -> TaskQueue {
        let mut queue = TaskQueue::new("suite");
        for name in names {
            let failing = fail_at == Some(*name);
            queue.enqueue(name, None, move |_ctx| {
                Box::pin(async move {
                    if failing {
                        Err(crate::common::Error::assertion("status", "200", "500"))
                    } else {
                        Ok(Value::Null)
                    }
                })
            });
        }
        queue
    }

    #[tokio::test]
    async fn env_persists_across_suites() {
        let mut login_suite = TaskQueue::new("auth");
        login_suite.enqueue("login", None, |ctx| {
            Box::pin(async move {
                ctx.env.set("token", "tok-1");
                Ok(json!({"token": "tok-1"}))
            })
        });

        let mut users_suite = TaskQueue::new("users");
        users_suite.enqueue("uses token", None, |ctx| {
            Box::pin(async move { ctx.env.require_credential("token").cloned() })
        });

        let mut runner = Runner::from_context(test_context(), FailFast::Off);
        let report = runner.run(vec![login_suite, users_suite]).await;
        assert!(!report.has_failures(), "{:?}", report);
        assert_eq!(
            runner.context().env.get_str("token").as_deref(),
            Some("tok-1")
        );
    }

    #[tokio::test]
    async fn run_scope_fail_fast_skips_later_suites() {
        let first = suite_with(&["a", "boom", "b"], Some("boom"));
        let second = suite_with(&["c"], None);

        let mut runner = Runner::from_context(test_context(), FailFast::Run);
        let report = runner.run(vec![first, second]).await;

        assert!(report.suites[0].aborted);
        assert!(report.suites[0].steps[2].is_skipped());
        assert!(report.suites[1].aborted);
        assert!(report.suites[1].steps.iter().all(|s| s.is_skipped()));
    }

    #[tokio::test]
    async fn suite_scope_fail_fast_still_runs_later_suites() {
        let first = suite_with(&["a", "boom", "b"], Some("boom"));
        let second = suite_with(&["c"], None);

        let mut runner = Runner::from_context(test_context(), FailFast::Suite);
        let report = runner.run(vec![first, second]).await;

        assert!(report.suites[0].steps[2].is_skipped());
        assert!(!report.suites[1].aborted);
        assert!(report.suites[1].steps.iter().all(|s| !s.is_skipped()));
    }

    #[tokio::test]
    async fn off_scope_runs_everything() {
        let first = suite_with(&["a", "boom", "b"], Some("boom"));
        let second = suite_with(&["c"], None);

        let mut runner = Runner::from_context(test_context(), FailFast::Off);
        let report = runner.run(vec![first, second]).await;

        assert_eq!(report.failed_steps(), 1);
        assert_eq!(report.skipped_steps(), 0);
    }
}
