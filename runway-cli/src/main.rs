//! Runway CLI
//!
//! Command-line interface for starting and following script executions.

mod commands;
mod config;
mod render;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "runway")]
#[command(about = "Runway script execution CLI", long_about = None)]
struct Cli {
    /// Runway API URL
    #[arg(long, env = "RUNWAY_API_URL", default_value = "http://localhost:8080")]
    api_url: String,

    /// Namespace scripts are looked up in
    #[arg(long, env = "RUNWAY_NAMESPACE", default_value = "default")]
    namespace: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = Config {
        api_url: cli.api_url,
        namespace: cli.namespace,
    };

    handle_command(cli.command, &config).await
}
