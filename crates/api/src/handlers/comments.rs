//! Handlers for `/artworks/{id}/comments`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use gallery_core::types::{DbId, Timestamp};
use gallery_db::models::comment::CommentWithAuthor;
use gallery_db::repositories::{ArtworkRepo, CommentRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /artworks/{id}/comments`.
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

/// A freshly posted comment plus the artwork state it produced.
#[derive(Debug, Serialize)]
pub struct CommentCreated {
    pub id: DbId,
    pub artwork_id: DbId,
    pub user_id: DbId,
    pub username: String,
    pub content: String,
    pub created_at: Timestamp,
    pub comment_count: i64,
    /// Whether this comment satisfied the reveal conditions.
    pub revealed: bool,
}

/// GET /api/v1/artworks/{id}/comments?limit=&offset=
pub async fn list_comments(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(artwork_id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<CommentWithAuthor>>>> {
    ArtworkRepo::find_by_id(&state.pool, artwork_id)
        .await?
        .ok_or_else(|| AppError::not_found("Artwork", artwork_id))?;

    let comments =
        CommentRepo::list_for_artwork(&state.pool, artwork_id, params.limit(), params.offset())
            .await?;
    Ok(Json(DataResponse { data: comments }))
}

/// POST /api/v1/artworks/{id}/comments
///
/// Any authenticated user may comment. Comments count toward interactive
/// reveal conditions.
pub async fn create_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(artwork_id): Path<DbId>,
    Json(input): Json<CreateCommentRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<CommentCreated>>)> {
    let outcome = state
        .reveal_engine
        .record_comment(artwork_id, user.user_id, &input.content)
        .await?;

    tracing::debug!(
        artwork_id,
        comment_id = outcome.comment.id,
        comment_count = outcome.comment_count,
        revealed = outcome.revealed_now,
        "Comment posted"
    );

    let comment = outcome.comment;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CommentCreated {
                id: comment.id,
                artwork_id: comment.artwork_id,
                user_id: comment.user_id,
                username: outcome.author_name,
                content: comment.content,
                created_at: comment.created_at,
                comment_count: outcome.comment_count,
                revealed: outcome.revealed_now,
            },
        }),
    ))
}
