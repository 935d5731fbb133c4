//! Execution Service
//!
//! Business logic for starting script executions and following them until
//! they complete.

use std::sync::Arc;

use chrono::Utc;
use runway_core::domain::execution::Execution;
use runway_core::dto::execution::{DEFAULT_NAMESPACE, ExecuteOptions, RunRequest};
use runway_core::names::random_name;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::watcher::{PersistingHandler, WatcherSet};
use crate::definitions::ScriptStore;
use crate::executor::{ExecutorClient, ExecutorRegistry, WatchError};
use crate::metrics::{MetricsSink, TracingMetrics};
use crate::repository::{ExecutionRepository, RepositoryError};

/// Service error type
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("{0}")]
    Validation(String),

    #[error("script execution with name {name} already exists")]
    Conflict { name: String },

    #[error("can't get script definition: {0}")]
    Gateway(String),

    #[error("{0}")]
    Internal(String),

    #[error("script execution failed: {0}")]
    Dispatch(#[from] crate::executor::DispatchError),

    #[error("can't store execution: {0}")]
    Persistence(#[source] RepositoryError),

    #[error("execution {0} not found")]
    NotFound(Uuid),

    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
}

impl From<RepositoryError> for ExecutionError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => ExecutionError::NotFound(id),
            other => ExecutionError::Persistence(other),
        }
    }
}

/// Drives script executions
///
/// Resolves definitions and executors, dispatches runs, persists the initial
/// record and keeps one watch task per run folding progress into the
/// repository.
pub struct Orchestrator {
    repository: Arc<dyn ExecutionRepository>,
    scripts: Arc<dyn ScriptStore>,
    executors: ExecutorRegistry,
    metrics: Arc<dyn MetricsSink>,
    watchers: WatcherSet,
}

impl Orchestrator {
    pub fn new(
        repository: Arc<dyn ExecutionRepository>,
        scripts: Arc<dyn ScriptStore>,
        executors: ExecutorRegistry,
    ) -> Self {
        Self {
            repository,
            scripts,
            executors,
            metrics: Arc::new(TracingMetrics),
            watchers: WatcherSet::new(),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn watchers(&self) -> &WatcherSet {
        &self.watchers
    }

    /// Starts an execution of `script_id`
    ///
    /// Returns the initial record once it is stored. Progress is recorded in
    /// the background.
    pub async fn execute_run(
        &self,
        script_id: &str,
        request: RunRequest,
    ) -> Result<Execution, ExecutionError> {
        if script_id.trim().is_empty() {
            return Err(ExecutionError::Validation(
                "script id cannot be empty".to_string(),
            ));
        }

        if self.watchers.is_shutting_down() {
            return Err(ExecutionError::Internal(
                "orchestrator is shutting down".to_string(),
            ));
        }

        let RunRequest {
            name,
            namespace,
            parameters,
        } = request;
        let name = if name.trim().is_empty() {
            random_name()
        } else {
            name
        };
        let namespace = if namespace.is_empty() {
            DEFAULT_NAMESPACE.to_string()
        } else {
            namespace
        };

        if self
            .repository
            .find_by_name_and_script(&name, script_id)
            .await?
            .is_some()
        {
            return Err(ExecutionError::Conflict { name });
        }

        let spec = self
            .scripts
            .get(&namespace, script_id)
            .await
            .map_err(|e| ExecutionError::Gateway(e.to_string()))?;

        let executor = self
            .executors
            .get(&spec.script_type)
            .map_err(|e| ExecutionError::Internal(format!("can't get executor: {e}")))?;

        let options = ExecuteOptions {
            spec: spec.clone(),
            parameters: parameters.clone(),
        };

        let started = match executor.execute(&options).await {
            Ok(started) => started,
            Err(e) => {
                self.metrics.record_dispatch(&spec.script_type, Some(&e));
                warn!(script_id, name = %name, "dispatch failed: {}", e);
                return Err(e.into());
            }
        };

        let mut result = started.result;
        if result.start_time.is_none() {
            result.start_time = Some(Utc::now());
        }

        let script_type = spec.script_type.clone();
        let execution = Execution::new(
            script_id, namespace, name, started.id, spec, parameters, result,
        );

        if let Err(e) = self.repository.insert(&execution).await {
            self.metrics.record_dispatch(&script_type, Some(&e));
            error!(
                execution_id = %execution.id,
                backend_id = %execution.backend_id,
                "execution dispatched but not stored: {}",
                e
            );
            return Err(match e {
                RepositoryError::Duplicate(_) => ExecutionError::Conflict {
                    name: execution.name,
                },
                other => ExecutionError::Persistence(other),
            });
        }

        self.spawn_watch(executor, execution.clone());
        self.metrics.record_dispatch(&script_type, None);

        info!(
            execution_id = %execution.id,
            script_id,
            name = %execution.name,
            status = %execution.result.status,
            "execution started"
        );

        Ok(execution)
    }

    fn spawn_watch(&self, executor: Arc<dyn ExecutorClient>, execution: Execution) {
        let repository = self.repository.clone();
        self.watchers
            .spawn(move |cancel| follow(executor, repository, execution, cancel));
    }

    pub async fn get(&self, id: Uuid) -> Result<Execution, ExecutionError> {
        Ok(self.repository.get(id).await?)
    }

    pub async fn get_by_name_and_script(
        &self,
        name: &str,
        script_id: &str,
    ) -> Result<Option<Execution>, ExecutionError> {
        Ok(self
            .repository
            .find_by_name_and_script(name, script_id)
            .await?)
    }

    pub async fn list_by_script(&self, script_id: &str) -> Result<Vec<Execution>, ExecutionError> {
        Ok(self.repository.list_by_script(script_id).await?)
    }

    pub async fn list_newest(&self, limit: usize) -> Result<Vec<Execution>, ExecutionError> {
        Ok(self.repository.list_newest(limit).await?)
    }

    /// Aborts a running execution
    ///
    /// Executors cannot abort runs yet; the attempt is recorded and reported
    /// as not implemented.
    pub async fn abort(&self, id: Uuid) -> Result<(), ExecutionError> {
        let execution = self.get(id).await?;
        let err = ExecutionError::NotImplemented("aborting executions");
        self.metrics
            .record_abort(&execution.spec.script_type, Some(&err));
        Err(err)
    }

    /// Cancels all watch tasks and waits for them to stop
    pub async fn shutdown(&self) {
        info!(active = self.watchers.active(), "stopping execution watchers");
        self.watchers.shutdown().await;
    }
}

async fn follow(
    executor: Arc<dyn ExecutorClient>,
    repository: Arc<dyn ExecutionRepository>,
    execution: Execution,
    cancel: CancellationToken,
) {
    let backend_id = execution.backend_id.clone();
    let execution_id = execution.id;
    let mut handler = PersistingHandler::new(repository, execution);

    match executor.watch(&backend_id, &mut handler, &cancel).await {
        Ok(result) => {
            info!(%execution_id, status = %result.status, "execution finished");
        }
        Err(WatchError::Cancelled) => {
            debug!(%execution_id, "watch cancelled");
        }
        Err(e) => {
            error!(%execution_id, "watching execution failed: {}", e);
        }
    }
}
