//! Route definitions for the `/artworks` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;

use crate::handlers::{artworks, comments};
use crate::state::AppState;

/// Headroom over the file limit for the other multipart fields and boundaries.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Routes mounted at `/artworks`.
///
/// ```text
/// GET    /                       -> list_gallery (revealed only)
/// POST   /                       -> create_artwork (artist, multipart)
/// GET    /mine                   -> list_mine (artist)
/// GET    /by-artist/{artist_id}  -> list_by_artist
/// GET    /{id}                   -> get_artwork (records a view)
/// PUT    /{id}                   -> update_artwork (owner)
/// DELETE /{id}                   -> delete_artwork (owner)
/// GET    /{id}/content           -> get_content
/// GET    /{id}/comments          -> list_comments
/// POST   /{id}/comments          -> create_comment
/// ```
///
/// Request bodies may be up to `max_upload_bytes` plus multipart overhead;
/// the exact file-size check happens in the handler.
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(artworks::list_gallery).post(artworks::create_artwork),
        )
        .route("/mine", get(artworks::list_mine))
        .route("/by-artist/{artist_id}", get(artworks::list_by_artist))
        .route(
            "/{id}",
            get(artworks::get_artwork)
                .put(artworks::update_artwork)
                .delete(artworks::delete_artwork),
        )
        .route("/{id}/content", get(artworks::get_content))
        .route(
            "/{id}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .layer(DefaultBodyLimit::max(
            max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
        ))
}
