//! apiflow - sequential HTTP API test runner
//!
//! Runs declarative YAML suites of HTTP steps in guaranteed order, sharing
//! auth tokens and created-entity ids across steps and suites.

use clap::Parser;

use apiflow::commands::Commands;
use apiflow::{cli, common};

#[derive(Parser)]
#[command(name = "apiflow", about = "Sequential HTTP API test runner")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    common::logging::init();

    let cli = Cli::parse();

    if let Err(e) = cli::dispatch(cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
