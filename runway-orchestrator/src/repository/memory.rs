//! In-memory execution repository
//!
//! Used when no database is configured and in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use runway_core::domain::execution::Execution;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ExecutionRepository, RepositoryError};

#[derive(Debug, Default)]
pub struct InMemoryExecutionRepository {
    executions: RwLock<HashMap<Uuid, Execution>>,
}

impl InMemoryExecutionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.executions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.executions.read().await.is_empty()
    }
}

fn newest_first(mut executions: Vec<Execution>) -> Vec<Execution> {
    executions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    executions
}

#[async_trait]
impl ExecutionRepository for InMemoryExecutionRepository {
    async fn insert(&self, execution: &Execution) -> Result<(), RepositoryError> {
        let mut executions = self.executions.write().await;

        if executions.contains_key(&execution.id) {
            return Err(RepositoryError::Duplicate(execution.id.to_string()));
        }

        let taken = executions
            .values()
            .any(|e| e.script_id == execution.script_id && e.name == execution.name);
        if taken {
            return Err(RepositoryError::Duplicate(format!(
                "{}/{}",
                execution.script_id, execution.name
            )));
        }

        executions.insert(execution.id, execution.clone());
        Ok(())
    }

    async fn update(&self, execution: &Execution) -> Result<(), RepositoryError> {
        let mut executions = self.executions.write().await;
        match executions.get_mut(&execution.id) {
            Some(stored) => {
                *stored = execution.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound(execution.id)),
        }
    }

    async fn get(&self, id: Uuid) -> Result<Execution, RepositoryError> {
        self.executions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn find_by_name_and_script(
        &self,
        name: &str,
        script_id: &str,
    ) -> Result<Option<Execution>, RepositoryError> {
        Ok(self
            .executions
            .read()
            .await
            .values()
            .find(|e| e.name == name && e.script_id == script_id)
            .cloned())
    }

    async fn list_by_script(&self, script_id: &str) -> Result<Vec<Execution>, RepositoryError> {
        let executions = self
            .executions
            .read()
            .await
            .values()
            .filter(|e| e.script_id == script_id)
            .cloned()
            .collect();
        Ok(newest_first(executions))
    }

    async fn list_newest(&self, limit: usize) -> Result<Vec<Execution>, RepositoryError> {
        let executions = self.executions.read().await.values().cloned().collect();
        let mut executions = newest_first(executions);
        executions.truncate(limit);
        Ok(executions)
    }
}
