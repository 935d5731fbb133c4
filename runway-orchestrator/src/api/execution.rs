//! Execution API Handlers
//!
//! HTTP endpoints for starting and querying script executions.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use runway_core::domain::execution::Execution;
use runway_core::dto::execution::RunRequest;
use uuid::Uuid;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};

/// Number of executions returned by the unfiltered listing
const NEWEST_LIMIT: usize = 10;

/// POST /v1/scripts/{id}/executions
/// Start a new execution of a script
pub async fn execute_script(
    State(state): State<AppState>,
    Path(script_id): Path<String>,
    Json(req): Json<RunRequest>,
) -> ApiResult<(StatusCode, Json<Execution>)> {
    tracing::info!("Executing script: {}", script_id);

    let execution = state.orchestrator.execute_run(&script_id, req).await?;

    Ok((StatusCode::CREATED, Json(execution)))
}

/// GET /v1/executions
/// List the most recent executions
pub async fn list_executions(State(state): State<AppState>) -> ApiResult<Json<Vec<Execution>>> {
    tracing::debug!("Listing newest executions");

    let executions = state.orchestrator.list_newest(NEWEST_LIMIT).await?;
    Ok(Json(executions))
}

/// GET /v1/scripts/{id}/executions
pub async fn list_script_executions(
    State(state): State<AppState>,
    Path(script_id): Path<String>,
) -> ApiResult<Json<Vec<Execution>>> {
    tracing::debug!("Listing executions of script: {}", script_id);

    let executions = state.orchestrator.list_by_script(&script_id).await?;
    Ok(Json(executions))
}

/// GET /v1/executions/{id}
pub async fn get_execution(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Execution>> {
    tracing::debug!("Getting execution: {}", id);

    let execution = state.orchestrator.get(id).await?;
    Ok(Json(execution))
}

/// GET /v1/scripts/{id}/executions/{name}
pub async fn get_script_execution(
    State(state): State<AppState>,
    Path((script_id, name)): Path<(String, String)>,
) -> ApiResult<Json<Execution>> {
    tracing::debug!("Getting execution {} of script {}", name, script_id);

    state
        .orchestrator
        .get_by_name_and_script(&name, &script_id)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "execution {} of script {} not found",
                name, script_id
            ))
        })
}

/// POST /v1/executions/{id}/abort
pub async fn abort_execution(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    tracing::info!("Aborting execution: {}", id);

    state.orchestrator.abort(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
