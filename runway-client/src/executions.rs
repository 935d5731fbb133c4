//! Execution and agent endpoints

use runway_core::domain::execution::Execution;
use runway_core::dto::execution::RunRequest;
use uuid::Uuid;

use crate::RunwayClient;
use crate::error::Result;

impl RunwayClient {
    /// Start an execution of a script
    pub async fn execute(&self, script_id: &str, req: &RunRequest) -> Result<Execution> {
        let url = format!("{}/v1/scripts/{}/executions", self.base_url, script_id);
        let response = self.client.post(&url).json(req).send().await?;

        self.handle_response(response).await
    }

    /// Get an execution by ID
    pub async fn get_execution(&self, id: Uuid) -> Result<Execution> {
        let url = format!("{}/v1/executions/{}", self.base_url, id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Get an execution by its name within a script
    pub async fn get_execution_by_name(&self, script_id: &str, name: &str) -> Result<Execution> {
        let url = format!(
            "{}/v1/scripts/{}/executions/{}",
            self.base_url, script_id, name
        );
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// List the most recent executions
    pub async fn list_executions(&self) -> Result<Vec<Execution>> {
        let url = format!("{}/v1/executions", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// List the executions of a script, newest first
    pub async fn list_script_executions(&self, script_id: &str) -> Result<Vec<Execution>> {
        let url = format!("{}/v1/scripts/{}/executions", self.base_url, script_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Request an execution to be aborted
    pub async fn abort_execution(&self, id: Uuid) -> Result<()> {
        let url = format!("{}/v1/executions/{}/abort", self.base_url, id);
        let response = self.client.post(&url).send().await?;

        self.handle_empty_response(response).await
    }

    /// List the agents connected to the control plane
    pub async fn list_agents(&self) -> Result<Vec<String>> {
        let url = format!("{}/v1/agents", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Start an execution through a connected agent
    pub async fn execute_on_agent(
        &self,
        agent_id: &str,
        script_id: &str,
        req: &RunRequest,
    ) -> Result<Execution> {
        let url = format!(
            "{}/v1/agents/{}/scripts/{}/executions",
            self.base_url, agent_id, script_id
        );
        let response = self.client.post(&url).json(req).send().await?;

        self.handle_response(response).await
    }
}
