//! CLI dispatch and report rendering

use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;

use crate::commands::Commands;
use crate::common::config::FailFast;
use crate::common::{Config, Error, Result};
use crate::engine::{RunReport, Runner, StepStatus, TaskQueue};
use crate::http::ReqwestClient;
use crate::suite;

/// Dispatch a parsed CLI command
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            suites,
            config,
            fail_fast,
        } => run(suites, config, fail_fast).await,
        Commands::Check { suites } => check(suites),
    }
}

async fn run(
    paths: Vec<PathBuf>,
    config_path: Option<PathBuf>,
    fail_fast: Option<FailFast>,
) -> Result<()> {
    let mut config = Config::load(config_path.as_deref())?;
    if let Some(scope) = fail_fast {
        config.fail_fast = scope;
    }

    let queues = compile_all(&paths)?;
    let mut runner = Runner::new(&config, Arc::new(ReqwestClient::new()));
    let report = runner.run(queues).await;

    print_report(&report);

    if report.has_failures() {
        return Err(Error::RunFailed(report.failed_steps()));
    }
    Ok(())
}

fn check(paths: Vec<PathBuf>) -> Result<()> {
    for queue in compile_all(&paths)? {
        println!("\n{} {}", "Suite:".blue().bold(), queue.suite().white().bold());
        for (i, (name, alias)) in queue.step_names().into_iter().enumerate() {
            match alias {
                Some(alias) => println!(
                    "  {:>3}. {} {}",
                    i + 1,
                    name,
                    format!("(as @{alias})").dimmed()
                ),
                None => println!("  {:>3}. {}", i + 1, name),
            }
        }
    }
    Ok(())
}

fn compile_all(paths: &[PathBuf]) -> Result<Vec<TaskQueue>> {
    paths
        .iter()
        .map(|path| suite::compile(suite::load_suite(path)?))
        .collect()
}

fn print_report(report: &RunReport) {
    for suite in &report.suites {
        println!("\n{} {}", "Suite:".blue().bold(), suite.suite.white().bold());
        for step in &suite.steps {
            match &step.status {
                StepStatus::Success => {
                    println!("  {} {}", "✓".green(), step.name.dimmed());
                }
                StepStatus::Skipped => {
                    println!("  {} {} {}", "-".yellow(), step.name.dimmed(), "(skipped)".yellow());
                }
                StepStatus::Failed { kind, message } => {
                    println!("  {} {} [{}] {}", "✗".red(), step.name, kind, message.red());
                }
            }
        }
    }

    let failed = report.failed_steps();
    let skipped = report.skipped_steps();
    let passed = report.total_steps() - failed - skipped;
    let summary = format!("{passed} passed, {failed} failed, {skipped} skipped");
    if failed == 0 {
        println!("\n{} {}\n", "✓".green().bold(), summary.green().bold());
    } else {
        println!("\n{} {}\n", "✗".red().bold(), summary.red().bold());
    }
}
