use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use gallery_core::error::CoreError;
use gallery_core::notification::{ChannelScope, ClientMessage, ServerMessage};
use gallery_core::types::DbId;
use gallery_db::repositories::{ArtworkRepo, UserRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{bearer_token, AuthUser};
use crate::state::AppState;
use crate::ws::manager::{text_frame, WsManager};

/// Query string accepted by the WebSocket endpoints. Browsers cannot set
/// headers on a WebSocket handshake, so the token may travel here.
#[derive(Debug, Default, Deserialize)]
pub struct WsAuthParams {
    pub token: Option<String>,
}

/// Resolve the caller from `?token=` or an `Authorization: Bearer` header.
fn token_from<'a>(params: &'a WsAuthParams, headers: &'a HeaderMap) -> AppResult<Option<&'a str>> {
    match params.token.as_deref() {
        Some(token) if !token.is_empty() => Ok(Some(token)),
        _ => bearer_token(headers),
    }
}

/// GET /api/v1/ws/artworks/{artwork_id}
///
/// Joins the artwork's watcher scope. Anonymous clients are allowed; an
/// unknown artwork rejects the handshake with 404.
pub async fn artwork_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(artwork_id): Path<DbId>,
    Query(params): Query<WsAuthParams>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let user_id = match token_from(&params, &headers)? {
        Some(token) => Some(AuthUser::from_token(token, &state.config.jwt)?.user_id),
        None => None,
    };

    // Existence only; the status greeting is read after the socket joins.
    ArtworkRepo::find_by_id(&state.pool, artwork_id)
        .await?
        .ok_or_else(|| AppError::not_found("Artwork", artwork_id))?;

    let scope = ChannelScope::Artwork(artwork_id);
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, scope, user_id)))
}

/// GET /api/v1/ws/notifications
///
/// Joins the caller's personal scope. A missing or invalid token, or an
/// inactive account, rejects the handshake with 401.
pub async fn notifications_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsAuthParams>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let token = token_from(&params, &headers)?.ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized(
            "Authentication token required".into(),
        ))
    })?;
    let auth = AuthUser::from_token(token, &state.config.jwt)?;

    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "User not found or inactive".into(),
            ))
        })?;

    let scope = ChannelScope::User(user.id);
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, scope, Some(user.id))))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection in `scope` with `WsManager`.
///   2. Queues the greeting on the connection's channel, so any event routed
///      after registration arrives after a status that is at least as fresh.
///   3. Spawns a sender task that forwards messages from the manager channel.
///   4. Processes inbound messages on the current task.
///   5. Cleans up on disconnect.
async fn handle_socket(
    socket: WebSocket,
    state: AppState,
    scope: ChannelScope,
    user_id: Option<DbId>,
) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, scope = %scope, ?user_id, "WebSocket connected");

    let (mut sink, mut stream) = socket.split();

    let ws_manager = Arc::clone(&state.ws_manager);
    let mut rx = ws_manager.add(conn_id.clone(), scope, user_id).await;

    match scope {
        ChannelScope::Artwork(artwork_id) => {
            send_artwork_status(&state, &ws_manager, &conn_id, artwork_id).await;
        }
        ChannelScope::User(_) => {
            send_message(&ws_manager, &conn_id, &ServerMessage::welcome()).await;
        }
    }

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let is_close = matches!(msg, Message::Close(_));
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
            if is_close {
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Text(text)) => {
                handle_client_text(&state, &ws_manager, &conn_id, scope, text.as_str()).await;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, scope = %scope, "WebSocket disconnected");
}

/// React to a client frame. Only `check_status` on an artwork scope does
/// anything; other or malformed input is ignored.
async fn handle_client_text(
    state: &AppState,
    ws_manager: &WsManager,
    conn_id: &str,
    scope: ChannelScope,
    text: &str,
) {
    let ChannelScope::Artwork(artwork_id) = scope else {
        return;
    };
    let Ok(ClientMessage::CheckStatus) = serde_json::from_str::<ClientMessage>(text) else {
        tracing::trace!(conn_id, "Ignoring unrecognised client message");
        return;
    };
    send_artwork_status(state, ws_manager, conn_id, artwork_id).await;
}

/// Push the artwork's current `artwork_status` to one connection. A deleted
/// artwork closes the connection instead.
async fn send_artwork_status(
    state: &AppState,
    ws_manager: &WsManager,
    conn_id: &str,
    artwork_id: DbId,
) {
    let artwork = match ArtworkRepo::find_by_id(&state.pool, artwork_id).await {
        Ok(Some(artwork)) => artwork,
        Ok(None) => {
            ws_manager.send_to(conn_id, Message::Close(None)).await;
            return;
        }
        Err(e) => {
            tracing::error!(error = %e, artwork_id, "Failed to load artwork status");
            return;
        }
    };

    let status = ServerMessage::artwork_status(artwork.id, artwork.title, artwork.is_revealed);
    send_message(ws_manager, conn_id, &status).await;
}

async fn send_message(ws_manager: &WsManager, conn_id: &str, message: &ServerMessage) {
    match text_frame(message) {
        Ok(frame) => {
            ws_manager.send_to(conn_id, frame).await;
        }
        Err(e) => tracing::error!(error = %e, conn_id, "Failed to encode server message"),
    }
}
