//! CLI command definitions using clap.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// rewind - namespaced undo/redo history
#[derive(Parser, Debug)]
#[command(name = "rewind")]
#[command(version)]
#[command(about = "Namespaced undo/redo history for mutation-based state stores")]
#[command(
    long_about = "rewind records every committed mutation per store module and replays history backward or forward on demand. Use `run` to drive a scripted session against the in-memory store."
)]
pub struct Cli {
    /// Tracing filter (overrides RUST_LOG), e.g. "debug" or "rewind_history=trace"
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run a scripted session and print the final state and history
    Run {
        /// History config file (.toml or .json)
        #[arg(short, long)]
        config: PathBuf,

        /// Script file (.json or .toml)
        #[arg(short, long)]
        script: PathBuf,

        /// Print compact JSON
        #[arg(long, default_value_t = false)]
        compact: bool,
    },

    /// Validate a config file and print the normalized histories
    Check {
        /// History config file (.toml or .json)
        #[arg(short, long)]
        config: PathBuf,
    },
}
