// Error types for the dashboard module

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::suggestions::SuggestionError;

/// Errors surfaced by the dashboard endpoint. Section-level read failures
/// never reach this type; they degrade into response warnings instead.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Unknown role or malformed query parameter
    #[error("Validation failed: {0}")]
    ValidationError(String),

    /// Database operation errors, converted from sqlx::Error
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// Errors bubbled up from the suggestion engine
    #[error(transparent)]
    EngineError(#[from] SuggestionError),
}

/// Result type alias for dashboard operations
pub type DashboardResult<T> = Result<T, DashboardError>;

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        match self {
            DashboardError::ValidationError(_) => {
                let body = Json(json!({
                    "success": false,
                    "error": self.to_string(),
                }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            DashboardError::DatabaseError(e) => {
                tracing::error!("Database error: {}", e);
                let body = Json(json!({
                    "success": false,
                    "error": "Database error",
                }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
            DashboardError::EngineError(e) => e.into_response(),
        }
    }
}
