use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

#[derive(Debug)]
pub enum ApiError {
    /// 400 with a message per failed check.
    ValidationError(Vec<String>),

    NotFound(String),

    Unauthorized(String),

    Forbidden(String),

    Conflict(String),

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ValidationError(msgs) => write!(f, "Validation error: {}", msgs.join(", ")),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// Error body: `message` is an array of strings for validation failures and
/// a single string for everything else.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    status_code: u16,
    message: ErrorMessage,
    error: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ErrorMessage {
    Single(String),
    Many(Vec<String>),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::ValidationError(msgs) => (StatusCode::BAD_REQUEST, ErrorMessage::Many(msgs)),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorMessage::Single(msg)),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, ErrorMessage::Single(msg)),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, ErrorMessage::Single(msg)),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, ErrorMessage::Single(msg)),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorMessage::Single("Internal server error".to_string()),
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorMessage::Single("Internal server error".to_string()),
                )
            }
        };

        let body = ErrorBody {
            status_code: status.as_u16(),
            message,
            error: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![msg.into()])
    }

    pub fn not_found(resource: &str) -> Self {
        ApiError::NotFound(format!("{} not found", resource))
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ApiError::Unauthorized(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}
