//! Agent command handlers

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use runway_client::RunwayClient;

use crate::config::Config;

/// Agent subcommands
#[derive(Subcommand)]
pub enum AgentCommands {
    /// List agents connected to the control plane
    List,
}

pub async fn handle_agent_command(command: AgentCommands, config: &Config) -> Result<ExitCode> {
    let client = RunwayClient::new(&config.api_url);

    match command {
        AgentCommands::List => {
            let agents = client.list_agents().await?;
            if agents.is_empty() {
                println!("{}", "No agents connected.".yellow());
            } else {
                println!("{}", format!("Found {} agent(s):", agents.len()).bold());
                for agent in agents {
                    println!("  {} {}", "▸".cyan(), agent);
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
