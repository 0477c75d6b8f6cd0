//! Handlers for the `/artworks` resource.

use std::collections::BTreeMap;

use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use gallery_core::artwork::{validate_title, validate_upload_size};
use gallery_core::error::CoreError;
use gallery_core::reveal::{ConditionInput, RevealCondition};
use gallery_core::types::DbId;
use gallery_db::models::artwork::{Artwork, ArtworkListItem, CreateArtwork, UpdateArtwork};
use gallery_db::models::comment::CommentWithAuthor;
use gallery_db::models::reveal_condition::RevealConditionRow;
use gallery_db::repositories::{ArtworkRepo, CommentRepo, RevealConditionRepo};
use serde::{Deserialize, Serialize};

use crate::engine::ViewerInfo;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireArtist;
use crate::query::{GalleryParams, DEFAULT_LIMIT};
use crate::response::DataResponse;
use crate::state::AppState;

/// MIME type stored when the upload does not declare one.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Full artwork view returned by `GET /artworks/{id}`.
#[derive(Debug, Serialize)]
pub struct ArtworkDetail {
    #[serde(flatten)]
    pub artwork: ArtworkListItem,
    pub reveal_conditions: Vec<RevealConditionRow>,
    /// Most recent comments, newest first.
    pub comments: Vec<CommentWithAuthor>,
    /// Where to fetch the decrypted content; absent while hidden (unless the
    /// caller owns the artwork).
    pub content_url: Option<String>,
}

/// Artwork plus its reveal conditions, returned by create and update.
#[derive(Debug, Serialize)]
pub struct ArtworkWithConditions {
    #[serde(flatten)]
    pub artwork: Artwork,
    pub reveal_conditions: Vec<RevealConditionRow>,
}

fn content_url(artwork_id: DbId) -> String {
    format!("/api/v1/artworks/{artwork_id}/content")
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// GET /api/v1/artworks?q=&limit=&offset=
///
/// The public gallery: revealed artworks only, newest first.
pub async fn list_gallery(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<GalleryParams>,
) -> AppResult<Json<DataResponse<Vec<ArtworkListItem>>>> {
    let page = params.page();
    let items = ArtworkRepo::list_revealed(
        &state.pool,
        params.q.as_deref(),
        page.limit(),
        page.offset(),
    )
    .await?;
    Ok(Json(DataResponse { data: items }))
}

/// GET /api/v1/artworks/mine
///
/// The calling artist's artworks, hidden ones included.
pub async fn list_mine(
    State(state): State<AppState>,
    RequireArtist(user): RequireArtist,
) -> AppResult<Json<DataResponse<Vec<ArtworkListItem>>>> {
    let items = ArtworkRepo::list_by_artist(&state.pool, user.user_id, true).await?;
    Ok(Json(DataResponse { data: items }))
}

/// GET /api/v1/artworks/by-artist/{artist_id}
///
/// Revealed artworks of one artist; the artist themselves also sees hidden ones.
pub async fn list_by_artist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(artist_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ArtworkListItem>>>> {
    let include_hidden = user.user_id == artist_id;
    let items = ArtworkRepo::list_by_artist(&state.pool, artist_id, include_hidden).await?;
    Ok(Json(DataResponse { data: items }))
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// Uploaded file pulled out of the multipart body.
struct UploadedFile {
    content_type: String,
    data: Vec<u8>,
}

/// POST /api/v1/artworks (multipart/form-data)
///
/// Fields: `title`, optional `description` and `placeholder_url`,
/// `reveal_conditions` (JSON array of `{condition_type, condition_value}`,
/// or indexed `reveal_conditions[N][condition_type]` /
/// `reveal_conditions[N][condition_value]` form fields), and `artwork_file`.
pub async fn create_artwork(
    State(state): State<AppState>,
    RequireArtist(user): RequireArtist,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<ArtworkWithConditions>>)> {
    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut placeholder_url: Option<String> = None;
    let mut conditions_json: Option<String> = None;
    let mut indexed: BTreeMap<usize, (Option<String>, Option<String>)> = BTreeMap::new();
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "artwork_file" {
            let content_type = field
                .content_type()
                .unwrap_or(FALLBACK_CONTENT_TYPE)
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            file = Some(UploadedFile {
                content_type,
                data: data.to_vec(),
            });
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        match name.as_str() {
            "title" => title = Some(text),
            "description" => description = non_blank(text),
            "placeholder_url" => placeholder_url = non_blank(text),
            "reveal_conditions" => conditions_json = Some(text),
            other => {
                if let Some((index, key)) = parse_indexed_condition_field(other) {
                    let slot = indexed.entry(index).or_default();
                    match key {
                        "condition_type" => slot.0 = Some(text),
                        _ => slot.1 = Some(text),
                    }
                }
            }
        }
    }

    let title = title
        .ok_or_else(|| AppError::BadRequest("Missing required 'title' field".into()))?
        .trim()
        .to_string();
    validate_title(&title)?;

    let conditions = match conditions_json {
        Some(raw) => parse_condition_list(&raw)?,
        None => parse_indexed_conditions(indexed)?,
    };
    if conditions.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "At least one reveal condition is required".into(),
        )));
    }

    let file = file
        .ok_or_else(|| AppError::BadRequest("Missing required 'artwork_file' field".into()))?;
    validate_upload_size(file.data.len(), state.config.max_upload_bytes)?;

    let encrypted = state.cipher.encrypt(&file.data)?;

    let input = CreateArtwork {
        title,
        description,
        artist_id: user.user_id,
        content_type: file.content_type,
        placeholder_url,
    };
    let artwork =
        ArtworkRepo::create_with_content(&state.pool, &input, &encrypted, &conditions).await?;
    let reveal_conditions = RevealConditionRepo::list_for_artwork(&state.pool, artwork.id).await?;

    tracing::info!(
        artwork_id = artwork.id,
        artist_id = user.user_id,
        conditions = reveal_conditions.len(),
        size_bytes = file.data.len(),
        "Artwork created"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: ArtworkWithConditions {
                artwork,
                reveal_conditions,
            },
        }),
    ))
}

fn non_blank(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parse the `reveal_conditions` JSON array into typed conditions.
fn parse_condition_list(raw: &str) -> AppResult<Vec<RevealCondition>> {
    let inputs: Vec<ConditionInput> = serde_json::from_str(raw).map_err(|e| {
        AppError::Core(CoreError::Validation(format!(
            "reveal_conditions must be a JSON array of {{condition_type, condition_value}}: {e}"
        )))
    })?;
    parse_condition_inputs(&inputs)
}

fn parse_condition_inputs(inputs: &[ConditionInput]) -> AppResult<Vec<RevealCondition>> {
    Ok(inputs
        .iter()
        .map(ConditionInput::parse)
        .collect::<Result<Vec<_>, _>>()?)
}

/// Split `reveal_conditions[3][condition_type]` into `(3, "condition_type")`.
fn parse_indexed_condition_field(name: &str) -> Option<(usize, &str)> {
    let rest = name.strip_prefix("reveal_conditions[")?;
    let (index, rest) = rest.split_once("][")?;
    let key = rest.strip_suffix(']')?;
    let index = index.parse().ok()?;
    matches!(key, "condition_type" | "condition_value").then_some((index, key))
}

fn parse_indexed_conditions(
    indexed: BTreeMap<usize, (Option<String>, Option<String>)>,
) -> AppResult<Vec<RevealCondition>> {
    indexed
        .into_iter()
        .map(|(index, pair)| -> AppResult<RevealCondition> {
            match pair {
                (Some(condition_type), Some(raw_value)) => {
                    let condition_value = serde_json::Value::String(raw_value);
                    Ok(RevealCondition::from_parts(&condition_type, &condition_value)?)
                }
                _ => Err(AppError::Core(CoreError::Validation(format!(
                    "reveal_conditions[{index}] needs both condition_type and condition_value"
                )))),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Detail
// ---------------------------------------------------------------------------

/// Client address: first `X-Forwarded-For` hop, else `X-Real-IP`.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}

/// GET /api/v1/artworks/{id}
///
/// Records a view, evaluates the reveal conditions, and returns the detail.
pub async fn get_artwork(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    headers: HeaderMap,
) -> AppResult<Json<DataResponse<ArtworkDetail>>> {
    let viewer = ViewerInfo {
        user_id: Some(user.user_id),
        ip_address: client_ip(&headers),
        user_agent: headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };
    let outcome = state.reveal_engine.record_view(id, &viewer).await?;
    if outcome.revealed_now {
        tracing::info!(artwork_id = id, viewer_id = user.user_id, "Artwork revealed on view");
    }

    let artwork = ArtworkRepo::find_item(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Artwork", id))?;
    let reveal_conditions = RevealConditionRepo::list_for_artwork(&state.pool, id).await?;
    let comments = CommentRepo::list_for_artwork(&state.pool, id, DEFAULT_LIMIT, 0).await?;

    let visible = artwork.is_revealed || artwork.artist_id == user.user_id;
    Ok(Json(DataResponse {
        data: ArtworkDetail {
            content_url: visible.then(|| content_url(id)),
            artwork,
            reveal_conditions,
            comments,
        },
    }))
}

/// GET /api/v1/artworks/{id}/content
///
/// Decrypted artwork bytes. Forbidden until revealed, except to the owner.
pub async fn get_content(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    let artwork = ArtworkRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Artwork", id))?;

    if !artwork.is_revealed && artwork.artist_id != user.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "This artwork has not been revealed yet".into(),
        )));
    }

    let content = ArtworkRepo::find_content(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("ArtworkContent", id))?;
    let plaintext = state.cipher.decrypt(&content.encrypted_content)?;

    Ok((
        [
            (CONTENT_TYPE, artwork.content_type),
            (CONTENT_LENGTH, plaintext.len().to_string()),
        ],
        Body::from(plaintext),
    )
        .into_response())
}

// ---------------------------------------------------------------------------
// Update / delete
// ---------------------------------------------------------------------------

/// Reject callers other than the artwork's artist.
fn ensure_owner(artwork: &Artwork, user: &AuthUser) -> AppResult<()> {
    if artwork.artist_id != user.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the artist can modify this artwork".into(),
        )));
    }
    Ok(())
}

/// Request body for `PUT /artworks/{id}`.
///
/// Absent fields are left alone. An empty `description` or `placeholder_url`
/// clears it. `reveal_conditions`, when present, replaces the whole set and
/// is only accepted while the artwork is hidden.
#[derive(Debug, Deserialize)]
pub struct UpdateArtworkRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub placeholder_url: Option<String>,
    pub reveal_conditions: Option<Vec<ConditionInput>>,
}

/// PUT /api/v1/artworks/{id}
pub async fn update_artwork(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateArtworkRequest>,
) -> AppResult<Json<DataResponse<ArtworkWithConditions>>> {
    let title = input.title.map(|t| t.trim().to_string());
    if let Some(title) = &title {
        validate_title(title)?;
    }
    let conditions = input
        .reveal_conditions
        .as_deref()
        .map(parse_condition_inputs)
        .transpose()?;
    if conditions.as_ref().is_some_and(Vec::is_empty) {
        return Err(AppError::Core(CoreError::Validation(
            "At least one reveal condition is required".into(),
        )));
    }
    let changes = UpdateArtwork {
        title,
        description: input.description.map(|d| d.trim().to_string()),
        placeholder_url: input.placeholder_url.map(|u| u.trim().to_string()),
    };

    let mut tx = state.pool.begin().await?;
    let artwork = ArtworkRepo::lock_for_update(&mut *tx, id)
        .await?
        .ok_or_else(|| AppError::not_found("Artwork", id))?;
    ensure_owner(&artwork, &user)?;
    if conditions.is_some() && artwork.is_revealed {
        return Err(AppError::Core(CoreError::Conflict(
            "Reveal conditions cannot change once the artwork is revealed".into(),
        )));
    }

    let mut artwork = ArtworkRepo::update(&mut *tx, id, &changes)
        .await?
        .ok_or_else(|| AppError::not_found("Artwork", id))?;
    if let Some(conditions) = &conditions {
        RevealConditionRepo::replace_for_artwork(&mut *tx, id, conditions).await?;
    }
    tx.commit().await?;

    // New conditions may already hold against the current counters.
    if conditions.is_some() && state.reveal_engine.check_reveal(id, Utc::now()).await? {
        tracing::info!(artwork_id = id, "Artwork revealed on condition update");
        artwork.is_revealed = true;
    }
    let reveal_conditions = RevealConditionRepo::list_for_artwork(&state.pool, id).await?;

    Ok(Json(DataResponse {
        data: ArtworkWithConditions {
            artwork,
            reveal_conditions,
        },
    }))
}

/// DELETE /api/v1/artworks/{id}
pub async fn delete_artwork(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let artwork = ArtworkRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Artwork", id))?;
    ensure_owner(&artwork, &user)?;
    if !ArtworkRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found("Artwork", id));
    }
    tracing::info!(artwork_id = id, artist_id = user.user_id, "Artwork deleted");
    Ok(StatusCode::NO_CONTENT)
}
