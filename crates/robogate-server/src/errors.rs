// crates/robogate-server/src/errors.rs
// ============================================================================
// Module: API Errors
// Description: Maps collaborator error types onto HTTP status codes.
// Dependencies: axum, thiserror
// ============================================================================

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use robogate_core::RobogateError;
use robogate_runtime::RunServiceError;
use serde_json::json;
use thiserror::Error;

/// The error type every handler in this crate returns.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No mission exists with the given id.
    #[error("mission {0} not found")]
    MissionNotFound(String),
    /// The request body failed a handler-level validation check.
    #[error("invalid request: {0}")]
    BadRequest(String),
    /// A run-lifecycle operation failed.
    #[error(transparent)]
    RunService(#[from] RunServiceError),
    /// A sim/store/policy collaborator reported a failure.
    #[error(transparent)]
    Collaborator(#[from] RobogateError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::MissionNotFound(_) | Self::RunService(RunServiceError::UnknownRun { .. }) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RunService(RunServiceError::AlreadyRunning { .. }) => StatusCode::CONFLICT,
            Self::RunService(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Collaborator(RobogateError::TransientExternal(_)) => StatusCode::BAD_GATEWAY,
            Self::Collaborator(RobogateError::ProtocolMismatch { .. }) => StatusCode::BAD_REQUEST,
            Self::Collaborator(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
