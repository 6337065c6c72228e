//! # rewind
//!
//! Command-line driver for the history engine.
//!
//! - `rewind run` builds an in-memory store from a history config, runs a
//!   script of commits, dispatches, undos and redos, and prints the result.
//! - `rewind check` validates a config and prints the normalized histories.
//!
//! Logs go to stderr; JSON output goes to stdout.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::expect_used)]

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use rewind::cli::Cli;
use rewind::commands::execute_command;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_level.as_deref());
    debug!(command = ?cli.command, "rewind starting");

    execute_command(cli.command).await
}

/// Initialize tracing subscriber with environment filter.
///
/// An explicit `--log-level` wins over `RUST_LOG`.
fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
