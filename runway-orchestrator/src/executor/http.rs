//! HTTP executor client
//!
//! Talks to an executor service exposing:
//! - `POST {uri}/v1/executions` with [`ExecuteOptions`], answering a [`BackendExecution`]
//! - `GET {uri}/v1/executions/{id}`, answering the current [`BackendExecution`]
//!
//! Watching is done by polling the second endpoint.

use async_trait::async_trait;
use reqwest::Client;
use runway_core::domain::execution::ExecutionResult;
use runway_core::domain::script::InputType;
use runway_core::dto::execution::{BackendExecution, ExecuteOptions};
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{DispatchError, ExecutorClient, SnapshotGate, UpdateHandler, WatchError};

/// Executor client for backends reachable over HTTP
#[derive(Debug, Clone)]
pub struct HttpExecutorClient {
    client: Client,
    base_url: String,
    script_type: String,
    input_types: Vec<InputType>,
    poll_interval: Duration,
}

impl HttpExecutorClient {
    /// Creates a client for the executor service at `base_url`
    ///
    /// # Arguments
    /// * `script_type` - Script type this backend runs
    /// * `base_url` - Base URL of the executor service
    /// * `input_types` - Input kinds the backend accepts
    /// * `poll_interval` - Delay between status polls while watching
    pub fn new(
        script_type: impl Into<String>,
        base_url: impl Into<String>,
        input_types: Vec<InputType>,
        poll_interval: Duration,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            script_type: script_type.into(),
            input_types,
            poll_interval,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch(&self, backend_id: &str) -> Result<BackendExecution, DispatchError> {
        let url = format!("{}/v1/executions/{}", self.base_url, backend_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DispatchError::Unreachable(e.to_string()))?;

        Self::handle_response(response).await
    }

    async fn handle_response(
        response: reqwest::Response,
    ) -> Result<BackendExecution, DispatchError> {
        let status = response.status();

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DispatchError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| DispatchError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ExecutorClient for HttpExecutorClient {
    async fn execute(&self, options: &ExecuteOptions) -> Result<BackendExecution, DispatchError> {
        if !self.input_types.contains(&options.spec.input_type) {
            return Err(DispatchError::UnsupportedInput {
                script_type: self.script_type.clone(),
                input_type: options.spec.input_type.to_string(),
            });
        }

        let url = format!("{}/v1/executions", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(options)
            .send()
            .await
            .map_err(|e| DispatchError::Unreachable(e.to_string()))?;

        let execution = Self::handle_response(response).await?;

        if execution.id.is_empty() {
            return Err(DispatchError::InvalidResponse(
                "executor returned an empty execution id".to_string(),
            ));
        }

        Ok(execution)
    }

    async fn watch(
        &self,
        backend_id: &str,
        handler: &mut dyn UpdateHandler,
        cancel: &CancellationToken,
    ) -> Result<ExecutionResult, WatchError> {
        let mut gate = SnapshotGate::new();
        let mut ticker = time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(WatchError::Cancelled),
                _ = ticker.tick() => {}
            }

            let result = self.fetch(backend_id).await?.result;

            if gate.admit(&result) {
                debug!(backend_id, status = %result.status, "executor reported change");
                handler
                    .on_update(&result)
                    .await
                    .map_err(WatchError::Handler)?;
            }

            if result.is_completed() {
                return Ok(result);
            }
        }
    }
}
