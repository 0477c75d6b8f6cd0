//! Handlers for the caller's own account under `/users/me`.

use axum::extract::State;
use axum::Json;
use gallery_core::error::CoreError;
use gallery_db::models::user::{UpdateProfile, UserResponse};
use gallery_db::repositories::{SessionRepo, UserRepo};
use serde::{Deserialize, Serialize};

use crate::auth::password::{
    hash_password, validate_password_strength, verify_password, MIN_PASSWORD_LENGTH,
};
use crate::error::{AppError, AppResult};
use crate::handlers::auth::validate_username;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `PUT/PATCH /users/me`. Absent fields are left alone; an
/// empty `bio` clears it.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub bio: Option<String>,
}

/// Request body for `PUT /users/me/change-password`.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

#[derive(Debug, Serialize)]
pub struct PasswordChanged {
    pub detail: &'static str,
    /// Refresh sessions invalidated by the change.
    pub sessions_revoked: u64,
}

/// GET /api/v1/users/me
pub async fn get_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", auth_user.user_id))?;
    Ok(Json(DataResponse {
        data: user.to_response(),
    }))
}

/// PUT/PATCH /api/v1/users/me
pub async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(input): Json<UpdateProfileRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let username = input.username.map(|u| u.trim().to_string());
    if let Some(username) = &username {
        validate_username(username)?;
    }
    let changes = UpdateProfile {
        username,
        bio: input.bio.map(|b| b.trim().to_string()),
    };

    let user = UserRepo::update_profile(&state.pool, auth_user.user_id, &changes)
        .await?
        .ok_or_else(|| AppError::not_found("User", auth_user.user_id))?;
    Ok(Json(DataResponse {
        data: user.to_response(),
    }))
}

/// PUT /api/v1/users/me/change-password
///
/// Verifies the old password, stores the new one and revokes every refresh
/// session so other devices must sign in again.
pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<Json<DataResponse<PasswordChanged>>> {
    if input.new_password != input.new_password_confirm {
        return Err(AppError::Core(CoreError::Validation(
            "New password fields do not match".into(),
        )));
    }
    validate_password_strength(&input.new_password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let user = UserRepo::find_by_id(&state.pool, auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", auth_user.user_id))?;
    let old_valid = verify_password(&input.old_password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !old_valid {
        return Err(AppError::Core(CoreError::Validation(
            "Old password is incorrect".into(),
        )));
    }

    let hashed = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    UserRepo::update_password(&state.pool, user.id, &hashed).await?;
    let sessions_revoked = SessionRepo::revoke_all_for_user(&state.pool, user.id).await?;

    tracing::info!(user_id = user.id, sessions_revoked, "Password changed");

    Ok(Json(DataResponse {
        data: PasswordChanged {
            detail: "Password updated successfully",
            sessions_revoked,
        },
    }))
}
