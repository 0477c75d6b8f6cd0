//! Repository for the `users` table.

use gallery_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::user::{CreateUser, UpdateProfile, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, username, email, password_hash, is_artist, bio, is_active, \
                        created_at, updated_at";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    ///
    /// Duplicate usernames or emails fail with a unique violation on
    /// `uq_users_username` / `uq_users_email`.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (username, email, password_hash, is_artist, bio)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.username)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(input.is_artist)
            .bind(&input.bio)
            .fetch_one(pool)
            .await
    }

    /// Find a user by id.
    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<User>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a user by their unique username.
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE username = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Look up just the username for a user id.
    pub async fn find_username<'e, E>(executor: E, id: DbId) -> Result<Option<String>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT username FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Update the caller-editable profile fields, returning the updated row.
    ///
    /// `None` keeps a field; an empty `bio` clears it.
    pub async fn update_profile(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProfile,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                username = COALESCE($2, username),
                bio = CASE WHEN $3::text IS NULL THEN bio ELSE NULLIF($3, '') END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&input.username)
            .bind(&input.bio)
            .fetch_optional(pool)
            .await
    }

    /// Replace a user's password hash. Returns `true` if the row was updated.
    pub async fn update_password(
        pool: &PgPool,
        id: DbId,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Soft-deactivate a user. Returns `true` if the row was updated.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET is_active = false WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
