//! Application-wide error types.

use serde_json::{Value, json};
use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Caller could not be authenticated.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Caller's role lacks the required capability.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Resource not found (or archived).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or incomplete input.
    #[error("Validation error on {field}: {message}")]
    Validation {
        /// The offending field.
        field: String,
        /// Machine-readable rule that failed.
        rule: String,
        /// Human-readable message.
        message: String,
    },

    /// An edit that would not change anything.
    #[error("No changes: {0}")]
    NoChanges(String),

    /// Referenced entity is missing or in an incompatible state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Validation { .. } => 400,
            Self::NoChanges(_) => 422,
            Self::Conflict(_) => 409,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::NoChanges(_) => "NO_CHANGES",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Renders the JSON body sent to API clients.
    ///
    /// Database and internal errors never leak their detail.
    #[must_use]
    pub fn to_body(&self) -> Value {
        match self {
            Self::Validation {
                field,
                rule,
                message,
            } => json!({
                "error": self.error_code(),
                "message": message,
                "field": field,
                "rule": rule,
            }),
            Self::Database(_) | Self::Internal(_) => json!({
                "error": self.error_code(),
                "message": "An internal error occurred",
            }),
            other => json!({
                "error": other.error_code(),
                "message": other.to_string(),
            }),
        }
    }
}
