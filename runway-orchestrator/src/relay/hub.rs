//! Agent registry
//!
//! Keeps the live session of every connected agent and routes requests to it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::{Sink, Stream, StreamExt};
use runway_core::relay::{AgentInbound, AgentOutbound, RelayResult, RelayedRun};
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::RelayError;
use super::session::{self, SessionHandle};

#[derive(Clone)]
pub struct RelayHub {
    sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
    request_timeout: Duration,
    handshake_timeout: Duration,
}

impl RelayHub {
    pub fn new(request_timeout: Duration, handshake_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            request_timeout,
            handshake_timeout,
        }
    }

    /// Serves one agent stream until it ends
    ///
    /// The first frame must be the agent's `Hello`. A new stream from an agent
    /// that is already connected replaces the old session, whose in-flight
    /// requests fail as session lost.
    pub async fn accept<St, Si>(&self, mut stream: St, sink: Si) -> Result<(), RelayError>
    where
        St: Stream<Item = Result<AgentOutbound, RelayError>> + Unpin + Send,
        Si: Sink<AgentInbound, Error = RelayError> + Unpin + Send + 'static,
    {
        let first = tokio::time::timeout(self.handshake_timeout, stream.next())
            .await
            .map_err(|_| RelayError::Handshake("no handshake received".to_string()))?;

        let agent_id = match first {
            Some(Ok(AgentOutbound::Hello { agent_id })) if !agent_id.trim().is_empty() => agent_id,
            Some(Ok(AgentOutbound::Hello { .. })) => {
                return Err(RelayError::Handshake("agent id cannot be empty".to_string()));
            }
            Some(Ok(_)) => {
                return Err(RelayError::Handshake(
                    "first frame must be a hello".to_string(),
                ));
            }
            Some(Err(e)) => return Err(RelayError::Handshake(e.to_string())),
            None => {
                return Err(RelayError::Handshake(
                    "stream closed before handshake".to_string(),
                ));
            }
        };

        let (handle, driver) = session::open(agent_id.clone(), self.request_timeout);
        let session_id = handle.session_id();

        if let Some(previous) = self.sessions.write().await.insert(agent_id.clone(), handle) {
            warn!(%agent_id, replaced = %previous.session_id(), "agent reconnected, replacing session");
            previous.close();
        }
        info!(%agent_id, %session_id, "agent connected");

        let outcome = driver.run(stream, sink).await;

        let mut sessions = self.sessions.write().await;
        if sessions
            .get(&agent_id)
            .is_some_and(|current| current.session_id() == session_id)
        {
            sessions.remove(&agent_id);
        }

        outcome
    }

    /// Relays a run to a connected agent
    pub async fn execute(&self, agent_id: &str, run: RelayedRun) -> Result<RelayResult, RelayError> {
        let handle = self
            .sessions
            .read()
            .await
            .get(agent_id)
            .cloned()
            .ok_or_else(|| RelayError::AgentNotConnected(agent_id.to_string()))?;

        handle.execute(run).await
    }

    /// Ids of the connected agents, sorted
    pub async fn agents(&self) -> Vec<String> {
        let mut agents: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        agents.sort();
        agents
    }

    /// Closes every session
    pub async fn shutdown(&self) {
        for handle in self.sessions.read().await.values() {
            handle.close();
        }
    }
}
