//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use runway_core::relay::{FailureKind, RelayFailure};

use crate::relay::RelayError;
use crate::service::ExecutionError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    BadGateway(String),
    GatewayTimeout(String),
    ServiceUnavailable(String),
    NotImplemented(String),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::BadGateway(msg) => {
                tracing::warn!("Bad gateway: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
            ApiError::GatewayTimeout(msg) => {
                tracing::warn!("Gateway timeout: {}", msg);
                (StatusCode::GATEWAY_TIMEOUT, msg)
            }
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::NotImplemented(msg) => (StatusCode::NOT_IMPLEMENTED, msg),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<ExecutionError> for ApiError {
    fn from(err: ExecutionError) -> Self {
        let message = err.to_string();
        match err {
            ExecutionError::Validation(_) => ApiError::BadRequest(message),
            ExecutionError::Conflict { .. } => ApiError::Conflict(message),
            ExecutionError::NotFound(_) => ApiError::NotFound(message),
            ExecutionError::Gateway(_) => ApiError::BadGateway(message),
            ExecutionError::NotImplemented(_) => ApiError::NotImplemented(message),
            ExecutionError::Internal(_)
            | ExecutionError::Dispatch(_)
            | ExecutionError::Persistence(_) => ApiError::InternalError(message),
        }
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        let message = err.to_string();
        match err {
            RelayError::AgentNotConnected(_) => ApiError::ServiceUnavailable(message),
            RelayError::SessionLost(_) | RelayError::TimedOut(_) => {
                ApiError::GatewayTimeout(message)
            }
            RelayError::Transport(_) | RelayError::Protocol(_) | RelayError::Handshake(_) => {
                ApiError::BadGateway(message)
            }
        }
    }
}

impl From<RelayFailure> for ApiError {
    fn from(failure: RelayFailure) -> Self {
        let RelayFailure { kind, message } = failure;
        match kind {
            FailureKind::Validation => ApiError::BadRequest(message),
            FailureKind::Conflict => ApiError::Conflict(message),
            FailureKind::NotFound => ApiError::NotFound(message),
            FailureKind::Gateway => ApiError::BadGateway(message),
            FailureKind::Internal | FailureKind::Dispatch | FailureKind::Persistence => {
                ApiError::InternalError(message)
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_errors_map_to_status_codes() {
        let cases = [
            (
                ExecutionError::Validation("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ExecutionError::Conflict {
                    name: "run-1".to_string(),
                },
                StatusCode::CONFLICT,
            ),
            (
                ExecutionError::Gateway("down".to_string()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ExecutionError::Internal("no executor".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ExecutionError::NotImplemented("aborting executions"),
                StatusCode::NOT_IMPLEMENTED,
            ),
        ];

        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_conflict_message() {
        let err = ExecutionError::Conflict {
            name: "run-1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "script execution with name run-1 already exists"
        );
    }

    #[test]
    fn test_lost_session_is_a_gateway_timeout() {
        let response = ApiError::from(RelayError::SessionLost(uuid::Uuid::new_v4())).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
