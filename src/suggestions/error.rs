// Error types for the Suggestion Engine
// Covers configuration validation, snapshot loading, and store failures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Main error type for the Suggestion Engine
///
/// Covers everything that can go wrong while constructing the engine,
/// loading data snapshots, running evaluators, and persisting suggestions.
#[derive(Debug, Error)]
pub enum SuggestionError {
    /// Invalid engine configuration (negative threshold, inverted window).
    /// Raised at construction, never mid-run.
    #[error("Invalid engine configuration: {0}")]
    InvalidConfiguration(String),

    /// Request-level validation failures (unknown category, bad filter)
    #[error("Validation failed: {0}")]
    ValidationError(String),

    /// A snapshot load did not finish before the caller's deadline
    #[error("Deadline exceeded while loading {0}")]
    DeadlineExceeded(String),

    /// Database operation errors, converted from sqlx::Error
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// JSON errors while encoding or decoding suggestion metadata
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Suggestion not found in the store
    #[error("Suggestion not found: {0}")]
    SuggestionNotFound(Uuid),

    /// Rejected lifecycle transition (e.g. resolved -> pending); the message
    /// comes from the status machine and already names both statuses
    #[error("{0}")]
    InvalidTransition(String),
}

/// Result type alias for Suggestion Engine operations
pub type SuggestionResult<T> = Result<T, SuggestionError>;

impl SuggestionError {
    /// Transient store errors are worth one retry with backoff;
    /// everything else fails the write immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            SuggestionError::DatabaseError(e) => matches!(
                e,
                sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::PoolClosed
            ),
            _ => false,
        }
    }
}

impl From<validator::ValidationErrors> for SuggestionError {
    fn from(err: validator::ValidationErrors) -> Self {
        SuggestionError::ValidationError(err.to_string())
    }
}

impl IntoResponse for SuggestionError {
    fn into_response(self) -> Response {
        // Internal failures are logged in full and masked in the body
        let (status, message) = match &self {
            SuggestionError::InvalidConfiguration(_)
            | SuggestionError::ValidationError(_)
            | SuggestionError::InvalidTransition(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            SuggestionError::SuggestionNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            SuggestionError::DeadlineExceeded(_) => {
                (StatusCode::GATEWAY_TIMEOUT, self.to_string())
            }
            SuggestionError::DatabaseError(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            SuggestionError::JsonError(e) => {
                tracing::error!("Metadata JSON error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        let body = Json(json!({
            "success": false,
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = SuggestionError::InvalidConfiguration("margin floor must be > 0".to_string());
        assert_eq!(
            error.to_string(),
            "Invalid engine configuration: margin floor must be > 0"
        );

        let id = Uuid::new_v4();
        let error = SuggestionError::SuggestionNotFound(id);
        assert_eq!(error.to_string(), format!("Suggestion not found: {}", id));
    }

    #[test]
    fn test_error_from_sqlx() {
        let sqlx_error = sqlx::Error::RowNotFound;
        let error: SuggestionError = sqlx_error.into();
        assert!(matches!(error, SuggestionError::DatabaseError(_)));
    }

    #[test]
    fn test_transient_classification() {
        let transient: SuggestionError = sqlx::Error::PoolTimedOut.into();
        assert!(transient.is_transient());

        let persistent: SuggestionError = sqlx::Error::RowNotFound.into();
        assert!(!persistent.is_transient());

        let config = SuggestionError::InvalidConfiguration("bad".to_string());
        assert!(!config.is_transient());
    }
}
