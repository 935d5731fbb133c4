//! Orchestrator configuration
//!
//! Settings are read from the environment once at startup and passed down
//! explicitly to the components that need them.

use std::path::PathBuf;
use std::time::Duration;

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP API binds to
    pub bind_addr: String,

    /// Postgres connection string; the in-memory repository is used when unset
    pub database_url: Option<String>,

    /// TOML catalog with executor descriptors and script definitions
    pub catalog_path: Option<PathBuf>,

    /// How often executor backends are polled while watching a run
    pub executor_poll_interval: Duration,

    /// How long a relayed command waits for the agent's response
    pub relay_request_timeout: Duration,

    /// How long a freshly connected agent has to introduce itself
    pub relay_handshake_timeout: Duration,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - ORCHESTRATOR_BIND_ADDR (optional, default: 0.0.0.0:8080)
    /// - DATABASE_URL (optional)
    /// - RUNWAY_CATALOG (optional, path to catalog file)
    /// - EXECUTOR_POLL_INTERVAL_MS (optional, default: 1000)
    /// - RELAY_REQUEST_TIMEOUT_SECS (optional, default: 60)
    /// - RELAY_HANDSHAKE_TIMEOUT_SECS (optional, default: 10)
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let bind_addr = std::env::var("ORCHESTRATOR_BIND_ADDR").unwrap_or(defaults.bind_addr);

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.is_empty());

        let catalog_path = std::env::var("RUNWAY_CATALOG").ok().map(PathBuf::from);

        let executor_poll_interval = std::env::var("EXECUTOR_POLL_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.executor_poll_interval);

        let relay_request_timeout = std::env::var("RELAY_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.relay_request_timeout);

        let relay_handshake_timeout = std::env::var("RELAY_HANDSHAKE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.relay_handshake_timeout);

        Ok(Self {
            bind_addr,
            database_url,
            catalog_path,
            executor_poll_interval,
            relay_request_timeout,
            relay_handshake_timeout,
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if let Some(url) = &self.database_url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                anyhow::bail!("database_url must be a postgres:// connection string");
            }
        }

        if self.executor_poll_interval.is_zero() {
            anyhow::bail!("executor_poll_interval must be greater than 0");
        }

        if self.relay_request_timeout.is_zero() {
            anyhow::bail!("relay_request_timeout must be greater than 0");
        }

        if self.relay_handshake_timeout.is_zero() {
            anyhow::bail!("relay_handshake_timeout must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            database_url: None,
            catalog_path: None,
            executor_poll_interval: Duration::from_secs(1),
            relay_request_timeout: Duration::from_secs(60),
            relay_handshake_timeout: Duration::from_secs(10),
        }
    }
}
