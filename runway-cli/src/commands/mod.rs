//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod agent;
mod execution;
mod run;

pub use agent::AgentCommands;
pub use execution::ExecutionCommands;
pub use run::RunArgs;

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;
use uuid::Uuid;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start an execution of a script
    Run(RunArgs),
    /// Execution queries
    Execution {
        #[command(subcommand)]
        command: ExecutionCommands,
    },
    /// Follow an execution until it completes
    Watch {
        /// Execution ID
        id: Uuid,
    },
    /// Relay agents
    Agent {
        #[command(subcommand)]
        command: AgentCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module. The exit code is
/// non-zero when a watched execution failed.
pub async fn handle_command(command: Commands, config: &Config) -> Result<ExitCode> {
    match command {
        Commands::Run(args) => run::handle_run(args, config).await,
        Commands::Execution { command } => {
            execution::handle_execution_command(command, config).await
        }
        Commands::Watch { id } => execution::watch_by_id(id, config).await,
        Commands::Agent { command } => agent::handle_agent_command(command, config).await,
    }
}
