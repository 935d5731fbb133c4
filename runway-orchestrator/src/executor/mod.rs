//! Executor clients
//!
//! An executor client dispatches runs to one backend family and can follow a
//! run until it completes. Concrete backends implement [`ExecutorClient`]; the
//! [`ExecutorRegistry`] maps script types to them.

mod http;
mod registry;

pub use http::HttpExecutorClient;
pub use registry::{ExecutorRegistry, RegistryError};

use async_trait::async_trait;
use runway_core::domain::execution::{ExecutionResult, ExecutionStatus};
use runway_core::dto::execution::{BackendExecution, ExecuteOptions};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Boxed error returned by update handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while starting a run on a backend
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("executor backend unreachable: {0}")]
    Unreachable(String),

    #[error("executor for '{script_type}' does not accept {input_type} input")]
    UnsupportedInput {
        script_type: String,
        input_type: String,
    },

    #[error("executor rejected the run (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid executor response: {0}")]
    InvalidResponse(String),
}

/// Errors that end a watch
#[derive(Debug, Error)]
pub enum WatchError {
    #[error(transparent)]
    Backend(#[from] DispatchError),

    #[error("update handler failed: {0}")]
    Handler(#[source] HandlerError),

    #[error("watch cancelled")]
    Cancelled,
}

/// Receives snapshots while a run is being watched
#[async_trait]
pub trait UpdateHandler: Send {
    /// Called every time the observed state of the run changes
    ///
    /// An error stops the watch and is returned to the watch caller. It does not
    /// affect the run on the backend.
    async fn on_update(&mut self, snapshot: &ExecutionResult) -> Result<(), HandlerError>;
}

/// Client for one runner backend family
#[async_trait]
pub trait ExecutorClient: Send + Sync {
    /// Starts a run; the returned result is the backend's initial view of it
    async fn execute(&self, options: &ExecuteOptions) -> Result<BackendExecution, DispatchError>;

    /// Follows a run until it is terminal or `cancel` fires
    ///
    /// Snapshots are delivered to `handler` in lifecycle order; an older
    /// snapshot is never delivered after a newer one. Returns the last
    /// observed result.
    async fn watch(
        &self,
        backend_id: &str,
        handler: &mut dyn UpdateHandler,
        cancel: &CancellationToken,
    ) -> Result<ExecutionResult, WatchError>;
}

/// Filters backend snapshots down to the ones worth delivering
///
/// Drops repeats of the last delivered snapshot and anything that would move
/// the lifecycle backwards.
#[derive(Debug, Default)]
pub struct SnapshotGate {
    last: Option<ExecutionResult>,
    reached: Option<ExecutionStatus>,
}

impl SnapshotGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `snapshot` should be delivered, and remembers it
    pub fn admit(&mut self, snapshot: &ExecutionResult) -> bool {
        let admitted = match &self.last {
            None => true,
            Some(last) => last != snapshot && snapshot.advances(last, self.reached),
        };
        if admitted {
            self.reached = snapshot.status.furthest(self.reached);
            self.last = Some(snapshot.clone());
        }
        admitted
    }
}
