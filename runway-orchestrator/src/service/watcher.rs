//! Background watchers
//!
//! Every dispatched run gets one watch task. The task owns the only copy of
//! the record that is written after creation, so updates for one execution
//! are applied strictly in order.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use runway_core::domain::execution::{Execution, ExecutionResult, ExecutionStatus};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::debug;

use crate::executor::{HandlerError, UpdateHandler};
use crate::repository::ExecutionRepository;

/// Tracked, cancellable set of watch tasks
#[derive(Debug, Clone, Default)]
pub struct WatcherSet {
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl WatcherSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a task that receives the set's cancellation token
    pub fn spawn<F, Fut>(&self, task: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = self.cancel.child_token();
        self.tracker.spawn(task(token));
    }

    /// Number of tasks still running
    pub fn active(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancels every task and waits for all of them to finish
    ///
    /// State already persisted by a task is left as is.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}

/// Folds watch snapshots into the stored record
///
/// Once the stored result is terminal nothing else is written, and snapshots
/// that are identical to or older than the stored one are skipped. A stored
/// `Unknown` does not lower the bar: the furthest status reached so far still
/// applies. Terminal results always carry an end time; others never do.
pub struct PersistingHandler {
    repository: Arc<dyn ExecutionRepository>,
    record: Execution,
    reached: Option<ExecutionStatus>,
}

impl PersistingHandler {
    pub fn new(repository: Arc<dyn ExecutionRepository>, record: Execution) -> Self {
        let reached = record.result.status.furthest(None);
        Self {
            repository,
            record,
            reached,
        }
    }

    pub fn record(&self) -> &Execution {
        &self.record
    }

    fn merge(&self, snapshot: &ExecutionResult) -> Option<ExecutionResult> {
        let current = &self.record.result;
        if current.is_completed() || !snapshot.advances(current, self.reached) {
            return None;
        }

        let mut next = snapshot.clone();
        if next.start_time.is_none() {
            next.start_time = current.start_time;
        }
        if !next.is_completed() {
            next.end_time = None;
        } else if next.end_time.is_none() {
            next.end_time = Some(Utc::now());
        }

        (next != *current).then_some(next)
    }
}

#[async_trait]
impl UpdateHandler for PersistingHandler {
    async fn on_update(&mut self, snapshot: &ExecutionResult) -> Result<(), HandlerError> {
        let Some(next) = self.merge(snapshot) else {
            return Ok(());
        };

        let mut record = self.record.clone();
        record.result = next;
        self.repository.update(&record).await?;

        debug!(
            execution_id = %record.id,
            status = %record.result.status,
            "execution record updated"
        );
        self.reached = record.result.status.furthest(self.reached);
        self.record = record;
        Ok(())
    }
}
