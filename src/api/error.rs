//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Error returned by route handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// Server-side failure. `details` is only filled outside production.
    #[error("{error}")]
    Internal {
        error: String,
        details: Option<String>,
    },
}

impl ApiError {
    /// Log `source` and wrap it in a generic `error` message, exposing the
    /// underlying cause only when `production` is false.
    pub fn internal(error: &str, source: impl std::fmt::Display, production: bool) -> Self {
        tracing::error!(cause = %source, "{}", error);
        Self::Internal {
            error: error.to_string(),
            details: (!production).then(|| source.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::BadRequest(error) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse { error, details: None },
            ),
            Self::NotFound(error) => (
                StatusCode::NOT_FOUND,
                ErrorResponse { error, details: None },
            ),
            Self::Internal { error, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse { error, details },
            ),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_hides_details() {
        match ApiError::internal("Failed to publish event", "disk full", true) {
            ApiError::Internal { details, .. } => assert!(details.is_none()),
            other => panic!("unexpected {:?}", other),
        }
        match ApiError::internal("Failed to publish event", "disk full", false) {
            ApiError::Internal { details, .. } => assert_eq!(details.as_deref(), Some("disk full")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::BadRequest("x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("x".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::internal("x", "y", true).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
