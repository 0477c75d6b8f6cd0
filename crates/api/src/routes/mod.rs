pub mod artworks;
pub mod auth;
pub mod health;
pub mod users;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws/artworks/{artwork_id}                        WebSocket (artwork scope)
/// /ws/notifications                                WebSocket (user scope, requires token)
///
/// /auth/register                                   register (public)
/// /auth/login                                      login (public)
/// /auth/refresh                                    refresh (public)
/// /auth/logout                                     logout (requires auth)
/// /auth/me                                         current user
///
/// /users/me                                        profile: get, update
/// /users/me/change-password                        change password
///
/// /artworks                                        gallery, create
/// /artworks/mine                                   caller's artworks
/// /artworks/by-artist/{artist_id}                  artist's artworks
/// /artworks/{id}                                   detail (records a view), update, delete
/// /artworks/{id}/content                           decrypted content
/// /artworks/{id}/comments                          list, create
/// ```
pub fn api_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        // WebSocket endpoints.
        .route("/ws/artworks/{artwork_id}", get(ws::artwork_ws_handler))
        .route("/ws/notifications", get(ws::notifications_ws_handler))
        // Authentication routes.
        .nest("/auth", auth::router())
        // The caller's own account.
        .nest("/users", users::router())
        // Artworks, their content and comments.
        .nest("/artworks", artworks::router(max_upload_bytes))
}
