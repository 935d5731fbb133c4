//! API Module
//!
//! HTTP API layer for the orchestrator.
//! Each submodule handles endpoints for a specific domain.

pub mod error;
pub mod execution;
pub mod health;
pub mod relay;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::relay::RelayHub;
use crate::service::Orchestrator;

/// Shared state of every handler
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub relay: RelayHub,
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Execution endpoints
        .route("/v1/executions", get(execution::list_executions))
        .route("/v1/executions/{id}", get(execution::get_execution))
        .route("/v1/executions/{id}/abort", post(execution::abort_execution))
        .route(
            "/v1/scripts/{id}/executions",
            post(execution::execute_script).get(execution::list_script_executions),
        )
        .route(
            "/v1/scripts/{id}/executions/{name}",
            get(execution::get_script_execution),
        )
        // Relay endpoints
        .route("/v1/agents", get(relay::list_agents))
        .route("/v1/agents/connect", get(relay::connect_agent))
        .route(
            "/v1/agents/{agent_id}/scripts/{id}/executions",
            post(relay::execute_on_agent),
        )
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
