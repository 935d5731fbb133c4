//! Relayed request handling
//!
//! Each relayed run goes through the agent's local orchestrator exactly as a
//! run started over HTTP would. Errors travel back as a kind plus a message.

use std::sync::Arc;

use async_trait::async_trait;
use runway_core::relay::{FailureKind, RelayFailure, RelayResult, RelayedRun};
use runway_orchestrator::service::{ExecutionError, Orchestrator};

#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, run: RelayedRun) -> RelayResult;
}

pub struct OrchestratorHandler {
    orchestrator: Arc<Orchestrator>,
}

impl OrchestratorHandler {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }
}

#[async_trait]
impl RequestHandler for OrchestratorHandler {
    async fn handle(&self, run: RelayedRun) -> RelayResult {
        match self
            .orchestrator
            .execute_run(&run.script_id, run.request)
            .await
        {
            Ok(execution) => RelayResult::Execution(Box::new(execution)),
            Err(e) => {
                tracing::warn!(script_id = %run.script_id, "relayed execution failed: {}", e);
                RelayResult::Failure(RelayFailure {
                    kind: failure_kind(&e),
                    message: e.to_string(),
                })
            }
        }
    }
}

pub fn failure_kind(err: &ExecutionError) -> FailureKind {
    match err {
        ExecutionError::Validation(_) => FailureKind::Validation,
        ExecutionError::Conflict { .. } => FailureKind::Conflict,
        ExecutionError::NotFound(_) => FailureKind::NotFound,
        ExecutionError::Gateway(_) => FailureKind::Gateway,
        ExecutionError::Dispatch(_) => FailureKind::Dispatch,
        ExecutionError::Persistence(_) => FailureKind::Persistence,
        ExecutionError::Internal(_) | ExecutionError::NotImplemented(_) => FailureKind::Internal,
    }
}
