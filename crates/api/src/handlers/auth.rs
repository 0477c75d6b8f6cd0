//! Handlers for the `/auth` resource (register, login, refresh, logout, me).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use gallery_core::error::CoreError;
use gallery_db::models::session::CreateSession;
use gallery_db::models::user::{CreateUser, User, UserResponse};
use gallery_db::repositories::{SessionRepo, UserRepo};
use serde::{Deserialize, Serialize};

use crate::auth::jwt::{generate_access_token, generate_refresh_token, hash_refresh_token};
use crate::auth::password::{
    hash_password, validate_password_strength, verify_password, MIN_PASSWORD_LENGTH,
};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Longest accepted username.
const MAX_USERNAME_LEN: usize = 150;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_artist: bool,
    pub bio: Option<String>,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Successful authentication response returned by register, login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
///
/// Create an account and sign it in. Returns 201 with tokens.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let username = input.username.trim();
    validate_username(username)?;
    let email = input.email.trim();
    if !email.contains('@') {
        return Err(AppError::Core(CoreError::Validation(
            "A valid email address is required".into(),
        )));
    }
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            is_artist: input.is_artist,
            bio: input.bio.filter(|b| !b.trim().is_empty()),
        },
    )
    .await?;

    tracing::info!(user_id = user.id, is_artist = user.is_artist, "User registered");

    let response = create_auth_response(&state, &user).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/auth/login
///
/// Authenticate with username + password. Returns access and refresh tokens.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = UserRepo::find_by_username(&state.pool, input.username.trim())
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid username or password".into(),
            ))
        })?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::debug!(user_id = user.id, "Login rejected: bad password");
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid username or password".into(),
        )));
    }

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    let response = create_auth_response(&state, &user).await?;
    Ok(Json(response))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a valid refresh token for new access + refresh tokens.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let token_hash = hash_refresh_token(&input.refresh_token);

    let session = SessionRepo::find_by_refresh_token_hash(&state.pool, &token_hash)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid or expired refresh token".into(),
            ))
        })?;

    // Rotation: a refresh token is single use.
    if !SessionRepo::revoke(&state.pool, session.id).await? {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid or expired refresh token".into(),
        )));
    }

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    let response = create_auth_response(&state, &user).await?;
    Ok(Json(response))
}

/// POST /api/v1/auth/logout
///
/// Revoke all sessions for the authenticated user. Returns 204 No Content.
pub async fn logout(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<StatusCode> {
    let revoked = SessionRepo::revoke_all_for_user(&state.pool, auth_user.user_id).await?;
    tracing::debug!(user_id = auth_user.user_id, revoked, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
pub async fn me(
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

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Reject empty or overlong usernames. Expects an already trimmed value.
pub(crate) fn validate_username(username: &str) -> AppResult<()> {
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Username must be between 1 and {MAX_USERNAME_LEN} characters"
        ))));
    }
    Ok(())
}

/// Generate access + refresh tokens, persist a session row, and build the response.
async fn create_auth_response(state: &AppState, user: &User) -> AppResult<AuthResponse> {
    let access_token = generate_access_token(user.id, user.role(), &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let (refresh_plaintext, refresh_hash) = generate_refresh_token();

    let expires_at = state.config.jwt.refresh_expires_at(Utc::now());

    SessionRepo::create(
        &state.pool,
        &CreateSession {
            user_id: user.id,
            refresh_token_hash: refresh_hash,
            expires_at,
        },
    )
    .await?;

    Ok(AuthResponse {
        access_token,
        refresh_token: refresh_plaintext,
        expires_in: state.config.jwt.access_expires_in_secs(),
        user: user.to_response(),
    })
}
