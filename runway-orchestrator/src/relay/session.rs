//! Relay sessions
//!
//! A session is split in two halves: the cloneable [`SessionHandle`] callers
//! use to send requests, and the [`SessionDriver`] that owns the stream. The
//! driver runs two loops, one draining the outbound queue into the sink and
//! one reading answers off the stream.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::{Sink, SinkExt, Stream, StreamExt};
use runway_core::relay::{AgentInbound, AgentOutbound, ExecuteRequest, RelayResult, RelayedRun};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::RelayError;

const OUTBOUND_QUEUE: usize = 64;

#[derive(Default)]
struct PendingTable {
    waiters: HashMap<Uuid, oneshot::Sender<RelayResult>>,
    closed: bool,
}

/// Correlation ids waiting for an answer
#[derive(Default)]
struct Pending {
    table: Mutex<PendingTable>,
}

impl Pending {
    fn lock(&self) -> MutexGuard<'_, PendingTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, correlation_id: Uuid) -> Result<oneshot::Receiver<RelayResult>, RelayError> {
        let mut table = self.lock();
        if table.closed {
            return Err(RelayError::SessionLost(correlation_id));
        }
        let (tx, rx) = oneshot::channel();
        table.waiters.insert(correlation_id, tx);
        Ok(rx)
    }

    /// Hands `result` to its waiter; false if nobody is waiting for it
    fn complete(&self, correlation_id: Uuid, result: RelayResult) -> bool {
        match self.lock().waiters.remove(&correlation_id) {
            Some(tx) => tx.send(result).is_ok(),
            None => false,
        }
    }

    fn forget(&self, correlation_id: Uuid) {
        self.lock().waiters.remove(&correlation_id);
    }

    /// Fails every waiter and refuses new ones
    fn close(&self) -> usize {
        let mut table = self.lock();
        table.closed = true;
        let dropped = table.waiters.len();
        table.waiters.clear();
        dropped
    }

    fn len(&self) -> usize {
        self.lock().waiters.len()
    }
}

/// Sending half of a relay session
#[derive(Clone)]
pub struct SessionHandle {
    agent_id: String,
    session_id: Uuid,
    outbound: mpsc::Sender<AgentInbound>,
    pending: Arc<Pending>,
    closed: CancellationToken,
    request_timeout: Duration,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("agent_id", &self.agent_id)
            .field("session_id", &self.session_id)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

impl SessionHandle {
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Requests sent and not answered yet
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Ends the session; the driver fails every in-flight request
    pub fn close(&self) {
        self.closed.cancel();
    }

    /// Sends a run to the agent and waits for its answer
    ///
    /// Nothing is retried. When the session ends or the answer does not arrive
    /// in time the outcome on the agent side is unknown.
    pub async fn execute(&self, run: RelayedRun) -> Result<RelayResult, RelayError> {
        let correlation_id = Uuid::new_v4();
        let answer = self.pending.register(correlation_id)?;

        let frame = AgentInbound::Execute(ExecuteRequest {
            correlation_id,
            options: run,
        });
        if self.outbound.send(frame).await.is_err() {
            self.pending.forget(correlation_id);
            return Err(RelayError::SessionLost(correlation_id));
        }
        debug!(agent_id = %self.agent_id, %correlation_id, "request relayed");

        match tokio::time::timeout(self.request_timeout, answer).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(_)) => Err(RelayError::SessionLost(correlation_id)),
            Err(_) => {
                self.pending.forget(correlation_id);
                Err(RelayError::TimedOut(correlation_id))
            }
        }
    }
}

/// Stream-owning half of a relay session
pub struct SessionDriver {
    agent_id: String,
    session_id: Uuid,
    outbound: mpsc::Receiver<AgentInbound>,
    pending: Arc<Pending>,
    closed: CancellationToken,
}

/// Creates both halves of a new session for `agent_id`
pub fn open(agent_id: impl Into<String>, request_timeout: Duration) -> (SessionHandle, SessionDriver) {
    let agent_id = agent_id.into();
    let session_id = Uuid::new_v4();
    let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE);
    let pending = Arc::new(Pending::default());
    let closed = CancellationToken::new();

    let handle = SessionHandle {
        agent_id: agent_id.clone(),
        session_id,
        outbound: tx,
        pending: pending.clone(),
        closed: closed.clone(),
        request_timeout,
    };
    let driver = SessionDriver {
        agent_id,
        session_id,
        outbound: rx,
        pending,
        closed,
    };
    (handle, driver)
}

impl SessionDriver {
    /// Relays frames until the stream ends, the sink fails or the session is
    /// closed
    ///
    /// Every request still waiting when this returns fails as session lost.
    pub async fn run<St, Si>(self, mut stream: St, sink: Si) -> Result<(), RelayError>
    where
        St: Stream<Item = Result<AgentOutbound, RelayError>> + Unpin + Send,
        Si: Sink<AgentInbound, Error = RelayError> + Unpin + Send + 'static,
    {
        let SessionDriver {
            agent_id,
            session_id,
            outbound,
            pending,
            closed,
        } = self;

        let pump = tokio::spawn(pump_outbound(outbound, sink, closed.clone()));

        let outcome = loop {
            let frame = tokio::select! {
                _ = closed.cancelled() => break Ok(()),
                frame = stream.next() => frame,
            };

            match frame {
                None => break Ok(()),
                Some(Ok(AgentOutbound::Executed(response))) => {
                    let correlation_id = response.correlation_id;
                    if !pending.complete(correlation_id, response.result) {
                        warn!(%agent_id, %correlation_id, "answer for unknown or abandoned request");
                    }
                }
                Some(Ok(AgentOutbound::Hello { .. })) => {
                    warn!(%agent_id, "ignoring repeated handshake");
                }
                Some(Err(e)) if !e.is_fatal() => {
                    warn!(%agent_id, "dropping frame: {}", e);
                }
                Some(Err(e)) => break Err(e),
            }
        };

        closed.cancel();
        let lost = pending.close();
        let pumped = pump
            .await
            .map_err(|e| RelayError::Transport(format!("outbound loop panicked: {e}")))?;

        info!(%agent_id, %session_id, lost, "relay session ended");
        outcome.and(pumped)
    }
}

async fn pump_outbound<Si>(
    mut outbound: mpsc::Receiver<AgentInbound>,
    mut sink: Si,
    closed: CancellationToken,
) -> Result<(), RelayError>
where
    Si: Sink<AgentInbound, Error = RelayError> + Unpin,
{
    let result = loop {
        let frame = tokio::select! {
            _ = closed.cancelled() => break Ok(()),
            frame = outbound.recv() => frame,
        };
        let Some(frame) = frame else {
            break Ok(());
        };
        if let Err(e) = sink.send(frame).await {
            break Err(e);
        }
    };

    closed.cancel();
    let _ = sink.close().await;
    result
}
