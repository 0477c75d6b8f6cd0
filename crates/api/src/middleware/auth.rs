//! JWT-based authentication extractors for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use gallery_core::error::CoreError;
use gallery_core::roles::ROLE_ARTIST;
use gallery_core::types::DbId;

use crate::auth::jwt::{validate_token, JwtConfig};
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a JWT Bearer token in the `Authorization` header.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    /// The user's role name (`"artist"` or `"viewer"`).
    pub role: String,
}

impl AuthUser {
    pub fn is_artist(&self) -> bool {
        self.role == ROLE_ARTIST
    }

    /// Validate a raw token string (no `Bearer ` prefix).
    pub fn from_token(token: &str, config: &JwtConfig) -> Result<Self, AppError> {
        let claims = validate_token(token, config).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;
        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
///
/// `Ok(None)` when the header is absent, `Err` when it is present but not a
/// bearer credential.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AppError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| {
        AppError::Core(CoreError::Unauthorized(
            "Invalid Authorization header".into(),
        ))
    })?;
    value.strip_prefix("Bearer ").map(Some).ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized(
            "Invalid Authorization format. Expected: Bearer <token>".into(),
        ))
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?.ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Missing Authorization header".into(),
            ))
        })?;
        AuthUser::from_token(token, &state.config.jwt)
    }
}
