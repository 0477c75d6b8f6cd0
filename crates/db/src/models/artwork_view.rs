//! Tracked artwork views.

use gallery_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `artwork_views` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ArtworkView {
    pub id: DbId,
    pub artwork_id: DbId,
    pub viewer_id: Option<DbId>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub viewed_at: Timestamp,
}

/// DTO for recording a view.
#[derive(Debug, Default)]
pub struct CreateArtworkView {
    pub artwork_id: DbId,
    pub viewer_id: Option<DbId>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}
