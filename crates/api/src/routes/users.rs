//! Route definitions for the `/users` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users`. All require auth.
///
/// ```text
/// GET       /me                 -> get_profile
/// PUT|PATCH /me                 -> update_profile
/// PUT       /me/change-password -> change_password
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/me",
            get(users::get_profile)
                .put(users::update_profile)
                .patch(users::update_profile),
        )
        .route("/me/change-password", put(users::change_password))
}
