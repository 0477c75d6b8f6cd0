//! Repository for the `artworks` and `artwork_contents` tables.

use gallery_core::reveal::RevealCondition;
use gallery_core::types::DbId;
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::models::artwork::{
    Artwork, ArtworkContent, ArtworkListItem, CreateArtwork, UpdateArtwork,
};
use crate::repositories::RevealConditionRepo;

/// Column list for plain `artworks` queries.
const COLUMNS: &str = "id, title, description, artist_id, content_type, placeholder_url, \
                        is_revealed, view_count, created_at, updated_at";

/// Select clause for [`ArtworkListItem`] rows (artist name + comment tally).
const LIST_SELECT: &str = "SELECT a.id, a.title, a.description, a.artist_id, \
        u.username AS artist_username, a.content_type, a.placeholder_url, \
        a.is_revealed, a.view_count, \
        (SELECT COUNT(*) FROM comments c WHERE c.artwork_id = a.id) AS comment_count, \
        a.created_at \
     FROM artworks a \
     JOIN users u ON u.id = a.artist_id";

/// Provides CRUD, listing and reveal-transition queries for artworks.
pub struct ArtworkRepo;

impl ArtworkRepo {
    /// Create an artwork together with its encrypted content and reveal
    /// conditions in a single transaction.
    pub async fn create_with_content(
        pool: &PgPool,
        input: &CreateArtwork,
        encrypted_content: &[u8],
        conditions: &[RevealCondition],
    ) -> Result<Artwork, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO artworks (title, description, artist_id, content_type, placeholder_url)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        let artwork = sqlx::query_as::<_, Artwork>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.artist_id)
            .bind(&input.content_type)
            .bind(&input.placeholder_url)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO artwork_contents (artwork_id, encrypted_content, size_bytes)
             VALUES ($1, $2, $3)",
        )
        .bind(artwork.id)
        .bind(encrypted_content)
        .bind(encrypted_content.len() as i64)
        .execute(&mut *tx)
        .await?;

        for condition in conditions {
            RevealConditionRepo::create(&mut *tx, artwork.id, condition).await?;
        }

        tx.commit().await?;
        Ok(artwork)
    }

    /// Find an artwork by id.
    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<Artwork>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM artworks WHERE id = $1");
        sqlx::query_as::<_, Artwork>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find an artwork with its artist name and comment tally.
    pub async fn find_item(pool: &PgPool, id: DbId) -> Result<Option<ArtworkListItem>, sqlx::Error> {
        let query = format!("{LIST_SELECT} WHERE a.id = $1");
        sqlx::query_as::<_, ArtworkListItem>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List revealed artworks, newest first.
    ///
    /// `search` matches title, description or artist username
    /// (case-insensitive substring).
    pub async fn list_revealed(
        pool: &PgPool,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ArtworkListItem>, sqlx::Error> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{s}%"));
        let query = format!(
            "{LIST_SELECT}
             WHERE a.is_revealed = true
               AND ($1::text IS NULL
                    OR a.title ILIKE $1
                    OR a.description ILIKE $1
                    OR u.username ILIKE $1)
             ORDER BY a.created_at DESC, a.id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, ArtworkListItem>(&query)
            .bind(pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// List one artist's artworks, newest first.
    ///
    /// Hidden artworks are only included when `include_hidden` is set (the
    /// artist looking at their own work).
    pub async fn list_by_artist(
        pool: &PgPool,
        artist_id: DbId,
        include_hidden: bool,
    ) -> Result<Vec<ArtworkListItem>, sqlx::Error> {
        let query = format!(
            "{LIST_SELECT}
             WHERE a.artist_id = $1 AND ($2 OR a.is_revealed = true)
             ORDER BY a.created_at DESC, a.id DESC"
        );
        sqlx::query_as::<_, ArtworkListItem>(&query)
            .bind(artist_id)
            .bind(include_hidden)
            .fetch_all(pool)
            .await
    }

    /// Update editable fields, returning the updated row.
    ///
    /// `None` keeps a field; an empty `description` or `placeholder_url`
    /// clears it.
    pub async fn update<'e, E>(
        executor: E,
        id: DbId,
        input: &UpdateArtwork,
    ) -> Result<Option<Artwork>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE artworks SET
                title = COALESCE($2, title),
                description = CASE WHEN $3::text IS NULL THEN description
                                   ELSE NULLIF($3, '') END,
                placeholder_url = CASE WHEN $4::text IS NULL THEN placeholder_url
                                       ELSE NULLIF($4, '') END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Artwork>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.placeholder_url)
            .fetch_optional(executor)
            .await
    }

    /// Delete an artwork (cascades to content, conditions, comments, views).
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM artworks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Load the encrypted content blob.
    pub async fn find_content(
        pool: &PgPool,
        artwork_id: DbId,
    ) -> Result<Option<ArtworkContent>, sqlx::Error> {
        sqlx::query_as::<_, ArtworkContent>(
            "SELECT artwork_id, encrypted_content, size_bytes
             FROM artwork_contents WHERE artwork_id = $1",
        )
        .bind(artwork_id)
        .fetch_optional(pool)
        .await
    }

    // -- reveal transaction -------------------------------------------------

    /// Lock an artwork row for the rest of the transaction.
    ///
    /// Concurrent reveal checks on the same artwork queue behind this lock,
    /// which serializes the read-check-act sequence per artwork.
    pub async fn lock_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Artwork>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM artworks WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Artwork>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Atomically increment the view counter and return the new value.
    pub async fn increment_view_count(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE artworks SET view_count = view_count + 1 WHERE id = $1 RETURNING view_count",
        )
        .bind(id)
        .fetch_one(conn)
        .await
    }

    /// Flip `is_revealed` to true.
    ///
    /// Returns `true` only if this call performed the transition; an already
    /// revealed artwork is left untouched and yields `false`.
    pub async fn mark_revealed(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE artworks SET is_revealed = true WHERE id = $1 AND is_revealed = false",
        )
        .bind(id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
