//! Relay tunnel frames
//!
//! The agent inside the cluster dials the control plane and holds a single
//! bidirectional stream. Frames are named from the agent's point of view:
//!
//! - [`AgentInbound`] flows control plane → agent and carries `ExecuteRequest`s.
//! - [`AgentOutbound`] flows agent → control plane and carries the handshake and
//!   `ExecuteResponse`s.
//!
//! Requests and responses are matched only by the correlation id in the payload,
//! so any number of commands may be in flight on one stream.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::execution::Execution;
use crate::dto::execution::RunRequest;

/// Script execution the control plane wants the agent to perform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayedRun {
    pub script_id: String,
    pub request: RunRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub correlation_id: Uuid,
    pub options: RelayedRun,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub correlation_id: Uuid,
    pub result: RelayResult,
}

/// Outcome of a relayed execution as seen by the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "body", rename_all = "snake_case")]
pub enum RelayResult {
    Execution(Box<Execution>),
    Failure(RelayFailure),
}

/// Error category of a relayed execution, mirrored from the agent's orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Validation,
    Conflict,
    NotFound,
    Gateway,
    Internal,
    Dispatch,
    Persistence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// Frames sent from the control plane to the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentInbound {
    Execute(ExecuteRequest),
}

/// Frames sent from the agent to the control plane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentOutbound {
    /// First frame of every stream; binds the stream to an agent identity
    Hello { agent_id: String },
    Executed(ExecuteResponse),
}
