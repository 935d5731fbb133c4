//! Run command
//!
//! Starts an execution of a script, optionally through a relay agent, and can
//! follow it until it completes.

use std::collections::HashMap;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use runway_client::RunwayClient;
use runway_core::dto::execution::{RunParameters, RunRequest};

use super::execution;
use crate::config::Config;
use crate::render::render_details;

/// Poll interval while following a freshly started execution
const RUN_WATCH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Args)]
pub struct RunArgs {
    /// Script ID
    pub script: String,

    /// Execution name; generated by the server when omitted
    #[arg(long)]
    pub name: Option<String>,

    /// Execution variable (key=value), can be repeated
    #[arg(short = 'v', long = "variable", value_parser = parse_key_val)]
    pub variables: Vec<(String, String)>,

    /// File whose contents are passed as the variables file
    #[arg(long)]
    pub variables_file: Option<String>,

    /// Image override for container based executors
    #[arg(long)]
    pub image: Option<String>,

    /// Additional argument for the executor binary, can be repeated
    #[arg(long = "args", allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Environment variable (KEY=value), can be repeated
    #[arg(long = "env", value_parser = parse_key_val)]
    pub envs: Vec<(String, String)>,

    /// Secret reference (secret_name=secret_key), can be repeated
    #[arg(long = "secret", value_parser = parse_key_val)]
    pub secrets: Vec<(String, String)>,

    #[arg(long)]
    pub http_proxy: Option<String>,

    #[arg(long)]
    pub https_proxy: Option<String>,

    /// Follow the execution until it completes
    #[arg(short, long)]
    pub watch: bool,

    /// Start the execution through this relay agent
    #[arg(long)]
    pub agent: Option<String>,
}

/// Parse a single key=value pair
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let Some((key, value)) = s.split_once('=') else {
        return Err(format!("invalid KEY=value: no `=` found in `{}`", s));
    };
    if key.is_empty() {
        return Err(format!("invalid KEY=value: empty key in `{}`", s));
    }
    Ok((key.to_string(), value.to_string()))
}

impl RunArgs {
    fn into_request(self, namespace: &str) -> Result<RunRequest> {
        let variables_file_content = self
            .variables_file
            .map(|path| {
                std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read variables file {}", path))
            })
            .transpose()?;

        Ok(RunRequest {
            name: self.name.unwrap_or_default(),
            namespace: namespace.to_string(),
            parameters: RunParameters {
                params: self.variables.into_iter().collect(),
                variables_file_content,
                image: self.image,
                args: self.args,
                envs: self.envs.into_iter().collect::<HashMap<_, _>>(),
                secret_envs: self.secrets.into_iter().collect(),
                http_proxy: self.http_proxy,
                https_proxy: self.https_proxy,
            },
        })
    }
}

pub async fn handle_run(args: RunArgs, config: &Config) -> Result<ExitCode> {
    let client = RunwayClient::new(&config.api_url);
    let script = args.script.clone();
    let agent = args.agent.clone();
    let watch = args.watch;
    let request = args.into_request(&config.namespace)?;

    let execution = match &agent {
        Some(agent_id) => {
            println!(
                "{}",
                format!("Starting {} through agent {}...", script, agent_id).dimmed()
            );
            client.execute_on_agent(agent_id, &script, &request).await?
        }
        None => client.execute(&script, &request).await?,
    };

    println!("{}", "✓ Execution started".green());
    print!("{}", render_details(&execution));

    if !watch {
        return Ok(ExitCode::SUCCESS);
    }

    // Executions started through an agent live in the agent's cluster and
    // cannot be polled from here.
    if agent.is_some() {
        println!(
            "{}",
            "Watching is not available for executions started through an agent.".yellow()
        );
        return Ok(ExitCode::SUCCESS);
    }

    println!();
    execution::watch(client, execution.id, RUN_WATCH_INTERVAL).await
}
