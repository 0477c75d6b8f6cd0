//! User entity model and DTOs.

use gallery_core::roles::role_for;
use gallery_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_artist: bool,
    pub bio: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// Role name carried in access tokens.
    pub fn role(&self) -> &'static str {
        role_for(self.is_artist)
    }

    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role().to_string(),
            is_artist: self.is_artist,
            bio: self.bio.clone(),
            created_at: self.created_at,
        }
    }
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub role: String,
    pub is_artist: bool,
    pub bio: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for creating a new user. The password must already be hashed.
#[derive(Debug)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_artist: bool,
    pub bio: Option<String>,
}

/// DTO for a user editing their own profile.
#[derive(Debug, Default)]
pub struct UpdateProfile {
    pub username: Option<String>,
    pub bio: Option<String>,
}
