use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gallery_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `gallery_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Shorthand for a 404 on a gallery entity.
    pub fn not_found(entity: &'static str, id: gallery_core::types::DbId) -> Self {
        AppError::Core(CoreError::NotFound { entity, id })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            AppError::Database(err) => classify_sqlx_error(err),

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique_violation
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        conflict_message(constraint),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

fn conflict_message(constraint: &str) -> String {
    match constraint {
        "uq_users_username" => "Username is already taken".to_string(),
        "uq_users_email" => "Email is already registered".to_string(),
        other => format!("Duplicate value violates unique constraint: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn core_errors_map_to_statuses() {
        assert_eq!(status_of(AppError::not_found("Artwork", 1)), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(CoreError::Validation("bad".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(CoreError::Unauthorized("no".into()).into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(CoreError::Forbidden("no".into()).into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(CoreError::Internal("boom".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn row_not_found_is_404() {
        assert_eq!(
            status_of(AppError::Database(sqlx::Error::RowNotFound)),
            StatusCode::NOT_FOUND
        );
    }
}
