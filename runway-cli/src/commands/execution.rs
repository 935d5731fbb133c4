//! Execution command handlers
//!
//! Viewing, listing and watching executions.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use runway_client::{PollingWatcher, RunwayClient, WatchOutcome};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::Config;
use crate::render::{OutputTail, render_details, render_summary};

/// Poll interval of the `watch` command
const WATCH_INTERVAL: Duration = Duration::from_secs(2);

/// Execution subcommands
#[derive(Subcommand)]
pub enum ExecutionCommands {
    /// Get execution details
    Get {
        /// Execution ID, or execution name when --script is given
        id: String,

        /// Look the execution up by name within this script
        #[arg(long)]
        script: Option<String>,
    },
    /// List executions, newest first
    List {
        /// Only list executions of this script
        #[arg(long)]
        script: Option<String>,
    },
}

pub async fn handle_execution_command(
    command: ExecutionCommands,
    config: &Config,
) -> Result<ExitCode> {
    let client = RunwayClient::new(&config.api_url);

    match command {
        ExecutionCommands::Get { id, script } => get_execution(&client, &id, script).await?,
        ExecutionCommands::List { script } => list_executions(&client, script).await?,
    }

    Ok(ExitCode::SUCCESS)
}

async fn get_execution(client: &RunwayClient, id: &str, script: Option<String>) -> Result<()> {
    let execution = match script {
        Some(script_id) => client.get_execution_by_name(&script_id, id).await?,
        None => {
            let uuid = Uuid::parse_str(id)
                .with_context(|| format!("'{}' is not an execution ID, pass --script to look it up by name", id))?;
            client.get_execution(uuid).await?
        }
    };

    print!("{}", render_details(&execution));
    Ok(())
}

async fn list_executions(client: &RunwayClient, script: Option<String>) -> Result<()> {
    let executions = match &script {
        Some(script_id) => client.list_script_executions(script_id).await?,
        None => client.list_executions().await?,
    };

    if executions.is_empty() {
        println!("{}", "No executions found.".yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!("Found {} execution(s):", executions.len()).bold()
    );
    println!();
    for execution in &executions {
        println!("{}", render_summary(execution));
    }

    Ok(())
}

pub async fn watch_by_id(id: Uuid, config: &Config) -> Result<ExitCode> {
    let client = RunwayClient::new(&config.api_url);
    watch(client, id, WATCH_INTERVAL).await
}

/// Follows an execution, printing new output as it arrives
///
/// Ctrl-C stops watching without affecting the execution.
pub async fn watch(client: RunwayClient, id: Uuid, interval: Duration) -> Result<ExitCode> {
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    println!("{}", format!("Watching execution {}...", id).dimmed());

    let mut tail = OutputTail::new();
    let watcher = PollingWatcher::new(client, interval);
    let outcome = watcher
        .watch(id, &cancel, |execution| print!("{}", tail.advance(execution)))
        .await?;

    match outcome {
        WatchOutcome::Completed(execution) => {
            println!();
            print!("{}", render_details(&execution));
            if execution.result.is_failed() {
                println!("{}", "✗ Execution failed".red());
                Ok(ExitCode::FAILURE)
            } else {
                println!("{}", "✓ Execution completed".green());
                Ok(ExitCode::SUCCESS)
            }
        }
        WatchOutcome::Cancelled(_) => {
            println!("{}", "Stopped watching; the execution keeps running.".yellow());
            Ok(ExitCode::SUCCESS)
        }
    }
}
