//! Repository for the `comments` table.

use gallery_core::types::DbId;
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::models::comment::{Comment, CommentWithAuthor, CreateComment};

const COLUMNS: &str = "id, artwork_id, user_id, content, created_at, updated_at";

/// Provides comment inserts, listings and tallies.
pub struct CommentRepo;

impl CommentRepo {
    /// Insert a comment. Runs inside the reveal transaction so the comment
    /// count seen by the evaluator includes it.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateComment,
    ) -> Result<Comment, sqlx::Error> {
        let query = format!(
            "INSERT INTO comments (artwork_id, user_id, content)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(input.artwork_id)
            .bind(input.user_id)
            .bind(&input.content)
            .fetch_one(conn)
            .await
    }

    /// Number of comments on an artwork.
    pub async fn count_for_artwork<'e, E>(executor: E, artwork_id: DbId) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE artwork_id = $1")
            .bind(artwork_id)
            .fetch_one(executor)
            .await
    }

    /// Comments on an artwork with author names, newest first.
    pub async fn list_for_artwork(
        pool: &PgPool,
        artwork_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CommentWithAuthor>, sqlx::Error> {
        sqlx::query_as::<_, CommentWithAuthor>(
            "SELECT c.id, c.artwork_id, c.user_id, u.username, c.content, c.created_at
             FROM comments c
             JOIN users u ON u.id = c.user_id
             WHERE c.artwork_id = $1
             ORDER BY c.created_at DESC, c.id DESC
             LIMIT $2 OFFSET $3",
        )
        .bind(artwork_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }
}
