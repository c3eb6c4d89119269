//! Event domain error types

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Result type for event operations
pub type Result<T> = std::result::Result<T, EventError>;

/// Event domain errors
#[derive(Debug, Error)]
pub enum EventError {
    /// Pagination token could not be decoded
    #[error("Invalid pagination token: {0}")]
    InvalidCursor(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Event not found: {0}")]
    NotFound(Uuid),

    /// Store execution failure
    #[error("Database error: {0}")]
    Database(String),

    /// The caller abandoned the request before the store answered
    #[error("Request cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EventError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCursor(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            // 499 Client Closed Request
            Self::Cancelled => {
                StatusCode::from_u16(499).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable identifier used in error bodies
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidCursor(_) => "INVALID_CURSOR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Cancelled => "CANCELLED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Error body returned by every events endpoint
///
/// ```json
/// {
///   "code": 400,
///   "error": "INVALID_CURSOR",
///   "message": "Invalid pagination token: token is not valid base64"
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status code
    pub code: u16,
    /// Machine-readable error identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
}

impl IntoResponse for EventError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Store details stay in the logs, not in the response body
        let message = match &self {
            Self::Database(details) | Self::Internal(details) => {
                tracing::error!(error = %details, "Event request failed");
                "An internal error occurred".to_string()
            }
            other => {
                tracing::info!(error = %other, "Event request rejected");
                other.to_string()
            }
        };

        let body = ErrorResponse {
            code: status.as_u16(),
            error: self.error_type().to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<mongodb::error::Error> for EventError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<bson::ser::Error> for EventError {
    fn from(err: bson::ser::Error) -> Self {
        Self::Database(format!("BSON serialization error: {}", err))
    }
}

impl From<bson::de::Error> for EventError {
    fn from(err: bson::de::Error) -> Self {
        Self::Database(format!("BSON deserialization error: {}", err))
    }
}

impl From<axum::extract::rejection::QueryRejection> for EventError {
    fn from(rejection: axum::extract::rejection::QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for EventError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}
