//! Relay API Handlers
//!
//! Agents connect over a WebSocket carrying JSON relay frames. Callers of the
//! control plane can list agents and relay executions to them.

use axum::{
    Json,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt, future};
use runway_core::domain::execution::Execution;
use runway_core::dto::execution::RunRequest;
use runway_core::relay::{AgentInbound, AgentOutbound, RelayResult, RelayedRun};

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::relay::{RelayError, RelayHub};

/// GET /v1/agents/connect
/// WebSocket endpoint agents dial into
pub async fn connect_agent(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| serve_agent(state.relay, socket))
}

fn decode(message: Result<Message, axum::Error>) -> Option<Result<AgentOutbound, RelayError>> {
    match message {
        Ok(Message::Text(text)) => Some(
            serde_json::from_str(text.as_str()).map_err(|e| RelayError::Protocol(e.to_string())),
        ),
        Ok(Message::Binary(bytes)) => {
            Some(serde_json::from_slice(&bytes).map_err(|e| RelayError::Protocol(e.to_string())))
        }
        Ok(Message::Ping(_) | Message::Pong(_) | Message::Close(_)) => None,
        Err(e) => Some(Err(RelayError::Transport(e.to_string()))),
    }
}

fn encode(frame: AgentInbound) -> Result<Message, RelayError> {
    serde_json::to_string(&frame)
        .map(|json| Message::Text(json.into()))
        .map_err(|e| RelayError::Protocol(e.to_string()))
}

async fn serve_agent(relay: RelayHub, socket: WebSocket) {
    let (sink, stream) = socket.split();

    let stream = stream.filter_map(|message| future::ready(decode(message)));
    let sink = sink
        .sink_map_err(|e| RelayError::Transport(e.to_string()))
        .with(|frame| future::ready(encode(frame)));

    if let Err(e) = relay.accept(Box::pin(stream), Box::pin(sink)).await {
        tracing::warn!("Agent stream ended with error: {}", e);
    }
}

/// GET /v1/agents
pub async fn list_agents(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.relay.agents().await)
}

/// POST /v1/agents/{agent_id}/scripts/{id}/executions
/// Start an execution through a connected agent
pub async fn execute_on_agent(
    State(state): State<AppState>,
    Path((agent_id, script_id)): Path<(String, String)>,
    Json(request): Json<RunRequest>,
) -> ApiResult<Json<Execution>> {
    tracing::info!("Relaying execution of {} to agent {}", script_id, agent_id);

    let run = RelayedRun { script_id, request };
    match state.relay.execute(&agent_id, run).await? {
        RelayResult::Execution(execution) => Ok(Json(*execution)),
        RelayResult::Failure(failure) => Err(ApiError::from(failure)),
    }
}
