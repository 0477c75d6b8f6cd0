//! Repository for the `artwork_views` audit table.

use gallery_core::types::DbId;
use sqlx::{PgConnection, PgExecutor};

use crate::models::artwork_view::{ArtworkView, CreateArtworkView};

pub struct ArtworkViewRepo;

impl ArtworkViewRepo {
    /// Record one view. The denormalized `artworks.view_count` is bumped
    /// separately by [`ArtworkRepo::increment_view_count`](crate::repositories::ArtworkRepo::increment_view_count).
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateArtworkView,
    ) -> Result<ArtworkView, sqlx::Error> {
        sqlx::query_as::<_, ArtworkView>(
            "INSERT INTO artwork_views (artwork_id, viewer_id, ip_address, user_agent)
             VALUES ($1, $2, $3, $4)
             RETURNING id, artwork_id, viewer_id, ip_address, user_agent, viewed_at",
        )
        .bind(input.artwork_id)
        .bind(input.viewer_id)
        .bind(&input.ip_address)
        .bind(&input.user_agent)
        .fetch_one(conn)
        .await
    }

    pub async fn count_for_artwork<'e, E>(executor: E, artwork_id: DbId) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT COUNT(*) FROM artwork_views WHERE artwork_id = $1")
            .bind(artwork_id)
            .fetch_one(executor)
            .await
    }
}
