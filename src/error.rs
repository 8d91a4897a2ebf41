// Shared response envelope for the API
// Domain error types live next to their handlers (suggestions::error,
// dashboard::error); each of them serializes the failure side of this
// same shape.

use axum::Json;
use serde::Serialize;

/// Uniform response body: `{"success": true, "data": ...}` on the happy
/// path, `{"success": false, "error": "..."}` from the error types.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}
