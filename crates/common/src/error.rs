//! Error types for ludus.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
///
/// The friend-request variants (`InvalidSelfRequest`, `DuplicateRequest`,
/// `AlreadyIncoming`, `AlreadyFriends`) are produced by the resolver layer
/// only; the store layer never reports anything more specific than
/// `Conflict`, `Forbidden` or `NotFound`.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Cannot send a friend request to yourself")]
    InvalidSelfRequest,

    #[error("A friend request for this pair is already pending")]
    DuplicateRequest,

    #[error("This user has already sent you a friend request")]
    AlreadyIncoming,

    #[error("You are already friends with this user")]
    AlreadyFriends,

    // === Server Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::NotFound(_) | Self::UserNotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) | Self::Validation(_) | Self::InvalidSelfRequest => {
                StatusCode::BAD_REQUEST
            }
            Self::Conflict(_)
            | Self::DuplicateRequest
            | Self::AlreadyIncoming
            | Self::AlreadyFriends => StatusCode::CONFLICT,

            // 5xx Server Errors
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::InvalidSelfRequest => "SELF_REQUEST",
            Self::DuplicateRequest => "DUPLICATE_REQUEST",
            Self::AlreadyIncoming => "ALREADY_INCOMING",
            Self::AlreadyFriends => "ALREADY_FRIENDS",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Log server errors
        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_family_maps_to_409() {
        assert_eq!(
            AppError::DuplicateRequest.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::AlreadyIncoming.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::AlreadyFriends.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Conflict("already resolved".into()).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn self_request_is_a_bad_request() {
        assert_eq!(
            AppError::InvalidSelfRequest.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::InvalidSelfRequest.error_code(), "SELF_REQUEST");
    }

    #[test]
    fn server_errors_are_flagged() {
        assert!(AppError::Database("boom".into()).is_server_error());
        assert!(!AppError::Forbidden("nope".into()).is_server_error());
    }
}
