//! CLI command handlers.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::Path;

use anyhow::{Context, Result};
use rewind_history::HistoryOptions;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::cli::Commands;
use crate::script::{Script, Session};

/// Execute a CLI command.
pub async fn execute_command(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            config,
            script,
            compact,
        } => cmd_run(&config, &script, compact).await,

        Commands::Check { config } => cmd_check(&config),
    }
}

fn load_options(path: &Path) -> Result<HistoryOptions> {
    HistoryOptions::from_file(path)
        .with_context(|| format!("Failed to load history config from {}", path.display()))
}

/// Run a script against a fresh in-memory store.
async fn cmd_run(config: &Path, script: &Path, compact: bool) -> Result<()> {
    let options = load_options(config)?;
    let script = Script::from_file(script)
        .with_context(|| format!("Failed to load script from {}", script.display()))?;

    let session = Session::new(&options).context("Failed to build session store")?;
    info!(steps = script.steps.len(), "Running script");
    session.run(&script).await?;

    print_json(&session.report(), compact)
}

/// Print the histories a config would create.
fn cmd_check(config: &Path) -> Result<()> {
    let options = load_options(config)?;
    let paths: Vec<_> = options
        .path_configs()?
        .iter()
        .map(|path| {
            json!({
                "namespace": path.namespace().to_string(),
                "ignore_mutations": path.ignore_mutations(),
            })
        })
        .collect();

    info!(namespaces = paths.len(), "Config is valid");
    print_json(&paths, false)
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let text = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
    .context("Failed to serialize output")?;
    println!("{text}");
    Ok(())
}
