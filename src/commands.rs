//! CLI command definitions

use std::path::PathBuf;

use clap::Subcommand;

use crate::common::config::FailFast;

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one or more suite files against the configured API
    Run {
        /// Suite files (YAML) in execution order
        #[arg(required = true)]
        suites: Vec<PathBuf>,

        /// Config file (default: apiflow.toml if present)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the configured fail-fast scope
        #[arg(long, value_enum)]
        fail_fast: Option<FailFast>,
    },
    /// Parse suite files and list their steps without performing any I/O
    Check {
        /// Suite files (YAML)
        #[arg(required = true)]
        suites: Vec<PathBuf>,
    },
}
