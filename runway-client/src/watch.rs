//! Polling watcher
//!
//! Follows an execution by fetching it at a fixed interval and handing every
//! snapshot to the caller until it completes.

use std::time::Duration;

use async_trait::async_trait;
use runway_core::domain::execution::Execution;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::RunwayClient;
use crate::error::Result;

/// Somewhere an execution can be fetched from
#[async_trait]
pub trait ExecutionSource: Send + Sync {
    async fn fetch(&self, id: Uuid) -> Result<Execution>;
}

#[async_trait]
impl ExecutionSource for RunwayClient {
    async fn fetch(&self, id: Uuid) -> Result<Execution> {
        self.get_execution(id).await
    }
}

/// How a watch ended
#[derive(Debug, Clone, PartialEq)]
pub enum WatchOutcome {
    /// The execution reached a terminal state
    Completed(Execution),
    /// The watch was cancelled; holds the last snapshot seen, if any
    Cancelled(Option<Execution>),
}

pub struct PollingWatcher<S> {
    source: S,
    interval: Duration,
}

impl<S: ExecutionSource> PollingWatcher<S> {
    pub fn new(source: S, interval: Duration) -> Self {
        Self { source, interval }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Polls `id` until it is terminal, `cancel` fires, or a fetch fails
    ///
    /// Cancellation is checked before each poll; a fetch already in flight
    /// is allowed to finish. Fetch errors are returned as they occur.
    pub async fn watch<F>(
        &self,
        id: Uuid,
        cancel: &CancellationToken,
        mut on_update: F,
    ) -> Result<WatchOutcome>
    where
        F: FnMut(&Execution) + Send,
    {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last = None;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(WatchOutcome::Cancelled(last)),
                _ = ticker.tick() => {}
            }

            let execution = self.source.fetch(id).await?;
            tracing::debug!(%id, status = %execution.result.status, "polled execution");
            on_update(&execution);

            if execution.result.is_completed() {
                return Ok(WatchOutcome::Completed(execution));
            }
            last = Some(execution);
        }
    }
}
