//! Runway HTTP Client
//!
//! Type-safe client for the Runway orchestrator API, plus a
//! [`PollingWatcher`] that follows an execution until it completes.
//!
//! # Example
//!
//! ```no_run
//! use runway_client::RunwayClient;
//! use runway_core::dto::execution::RunRequest;
//!
//! # async fn example() -> runway_client::Result<()> {
//! let client = RunwayClient::new("http://localhost:8080");
//! let execution = client
//!     .execute("demo-script", &RunRequest::new("run-1").with_param("key", "value"))
//!     .await?;
//! println!("Started execution: {}", execution.id);
//! # Ok(())
//! # }
//! ```

pub mod error;
mod executions;
pub mod watch;

pub use error::{ClientError, Result};
pub use watch::{ExecutionSource, PollingWatcher, WatchOutcome};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the Runway orchestrator API
#[derive(Debug, Clone)]
pub struct RunwayClient {
    /// Base URL of the orchestrator (e.g., "http://localhost:8080")
    base_url: String,
    client: Client,
}

impl RunwayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a client with a configured reqwest Client (timeouts, proxies, TLS)
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}
