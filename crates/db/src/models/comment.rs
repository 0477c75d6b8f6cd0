//! Comment model and DTOs.

use gallery_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `comments` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Comment {
    pub id: DbId,
    pub artwork_id: DbId,
    pub user_id: DbId,
    pub content: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A comment joined with its author's username.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CommentWithAuthor {
    pub id: DbId,
    pub artwork_id: DbId,
    pub user_id: DbId,
    pub username: String,
    pub content: String,
    pub created_at: Timestamp,
}

/// DTO for creating a comment.
#[derive(Debug, Deserialize)]
pub struct CreateComment {
    pub artwork_id: DbId,
    pub user_id: DbId,
    pub content: String,
}
