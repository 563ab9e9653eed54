//! Error types for event decoding.

use thiserror::Error;

/// Errors that can occur when decoding proxy core events.
#[derive(Debug, Error)]
pub enum EventError {
    /// The payload is not well-formed JSON.
    #[error("malformed event payload: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload carries no `type` discriminant.
    #[error("event payload has no type discriminant")]
    MissingType,
}
