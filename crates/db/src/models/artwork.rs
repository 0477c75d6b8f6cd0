//! Artwork entity, joined list item, encrypted content, and DTOs.

use gallery_core::notification::ArtworkRef;
use gallery_core::reveal::RevealState;
use gallery_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `artworks` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Artwork {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub artist_id: DbId,
    pub content_type: String,
    pub placeholder_url: Option<String>,
    pub is_revealed: bool,
    pub view_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Artwork {
    pub fn reveal_state(&self) -> RevealState {
        RevealState::from_flag(self.is_revealed)
    }

    /// Build the notification reference once the artist's name is known.
    pub fn to_ref(&self, artist_name: impl Into<String>) -> ArtworkRef {
        ArtworkRef {
            id: self.id,
            title: self.title.clone(),
            artist_id: self.artist_id,
            artist_name: artist_name.into(),
        }
    }
}

/// An artwork joined with its artist's username and comment tally.
///
/// Used by gallery listings and the detail view.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ArtworkListItem {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub artist_id: DbId,
    pub artist_username: String,
    pub content_type: String,
    pub placeholder_url: Option<String>,
    pub is_revealed: bool,
    pub view_count: i64,
    pub comment_count: i64,
    pub created_at: Timestamp,
}

/// Encrypted artwork bytes from `artwork_contents`.
#[derive(Debug, Clone, FromRow)]
pub struct ArtworkContent {
    pub artwork_id: DbId,
    pub encrypted_content: Vec<u8>,
    pub size_bytes: i64,
}

/// DTO for creating a new artwork. Assembled by the upload handler.
#[derive(Debug)]
pub struct CreateArtwork {
    pub title: String,
    pub description: Option<String>,
    pub artist_id: DbId,
    pub content_type: String,
    pub placeholder_url: Option<String>,
}

/// DTO for updating an artwork. Reveal state and counters are not editable.
///
/// `Some("")` clears `description` or `placeholder_url`.
#[derive(Debug, Default)]
pub struct UpdateArtwork {
    pub title: Option<String>,
    pub description: Option<String>,
    pub placeholder_url: Option<String>,
}
