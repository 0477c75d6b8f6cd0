use crate::types::DbId;

/// Domain-level error shared by every gallery crate.
///
/// HTTP status mapping lives in the API crate; this type stays transport
/// agnostic so the evaluator and repositories can use it directly.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// Malformed input, including reveal-condition payloads rejected at
    /// artwork creation time.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
