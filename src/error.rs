use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("no donation destinations: {0}")]
    NoCandidates(String),

    #[error("routing service unavailable")]
    RoutingUnavailable,

    #[error("could not allocate units to any food bank")]
    AllocationImpossible,

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::InvalidInput(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::NoCandidates(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::RoutingUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "routing service unavailable".to_string(),
            ),
            AppError::AllocationImpossible => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "could not allocate units to any food bank".to_string(),
            ),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
