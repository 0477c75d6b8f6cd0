//! Role-based access control extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use gallery_core::error::CoreError;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `artist` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn upload(RequireArtist(user): RequireArtist) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireArtist(pub AuthUser);

impl FromRequestParts<AppState> for RequireArtist {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_artist() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Artist role required".into(),
            )));
        }
        Ok(RequireArtist(user))
    }
}
