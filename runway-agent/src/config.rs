//! Agent configuration

use std::path::PathBuf;
use std::time::Duration;

/// Agent configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Identity announced to the control plane
    pub agent_id: String,

    /// Relay endpoint of the control plane (e.g., "ws://control-plane:8080/v1/agents/connect")
    pub control_plane_url: String,

    /// TOML catalog with the executors and scripts available in this cluster
    pub catalog_path: Option<PathBuf>,

    /// Postgres connection string; records are kept in memory when unset
    pub database_url: Option<String>,

    /// How often executor backends are polled while watching a run
    pub executor_poll_interval: Duration,

    /// First delay before reconnecting after the stream fails
    pub reconnect_delay: Duration,

    /// Upper bound for the reconnect delay
    pub max_reconnect_delay: Duration,
}

impl Config {
    pub fn new(agent_id: String, control_plane_url: String) -> Self {
        Self {
            agent_id,
            control_plane_url,
            catalog_path: None,
            database_url: None,
            executor_poll_interval: Duration::from_secs(1),
            reconnect_delay: Duration::from_secs(1),
            max_reconnect_delay: Duration::from_secs(60),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - AGENT_ID (required)
    /// - CONTROL_PLANE_URL (required)
    /// - RUNWAY_CATALOG (optional)
    /// - DATABASE_URL (optional)
    /// - EXECUTOR_POLL_INTERVAL_MS (optional, default: 1000)
    /// - RECONNECT_DELAY_SECS (optional, default: 1)
    /// - MAX_RECONNECT_DELAY_SECS (optional, default: 60)
    pub fn from_env() -> anyhow::Result<Self> {
        let agent_id = std::env::var("AGENT_ID")
            .map_err(|_| anyhow::anyhow!("AGENT_ID environment variable not set"))?;

        let control_plane_url = std::env::var("CONTROL_PLANE_URL")
            .map_err(|_| anyhow::anyhow!("CONTROL_PLANE_URL environment variable not set"))?;

        let mut config = Self::new(agent_id, control_plane_url);

        config.catalog_path = std::env::var("RUNWAY_CATALOG").ok().map(PathBuf::from);
        config.database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.is_empty());

        if let Some(interval) = std::env::var("EXECUTOR_POLL_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.executor_poll_interval = Duration::from_millis(interval);
        }

        if let Some(delay) = std::env::var("RECONNECT_DELAY_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.reconnect_delay = Duration::from_secs(delay);
        }

        if let Some(delay) = std::env::var("MAX_RECONNECT_DELAY_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.max_reconnect_delay = Duration::from_secs(delay);
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.agent_id.trim().is_empty() {
            anyhow::bail!("agent_id cannot be empty");
        }

        if !self.control_plane_url.starts_with("ws://")
            && !self.control_plane_url.starts_with("wss://")
        {
            anyhow::bail!("control_plane_url must start with ws:// or wss://");
        }

        if self.executor_poll_interval.is_zero() {
            anyhow::bail!("executor_poll_interval must be greater than 0");
        }

        if self.reconnect_delay.is_zero() {
            anyhow::bail!("reconnect_delay must be greater than 0");
        }

        if self.max_reconnect_delay < self.reconnect_delay {
            anyhow::bail!("max_reconnect_delay cannot be lower than reconnect_delay");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            "local-agent".to_string(),
            "ws://localhost:8080/v1/agents/connect".to_string(),
        )
    }
}
