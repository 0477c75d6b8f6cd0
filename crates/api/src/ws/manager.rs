use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::Message;
use gallery_core::notification::{ChannelScope, ServerMessage};
use gallery_core::types::{DbId, Timestamp};
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Encode a [`ServerMessage`] as a JSON text frame.
pub fn text_frame(message: &ServerMessage) -> Result<Message, serde_json::Error> {
    Ok(Message::Text(message.to_text()?.into()))
}

/// Metadata for a single WebSocket connection.
pub struct WsConnection {
    /// The broadcast group this connection listens on.
    pub scope: ChannelScope,
    /// Authenticated user, if the client sent a valid token.
    pub user_id: Option<DbId>,
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    pub connected_at: Timestamp,
}

/// Registry of live WebSocket connections, grouped by [`ChannelScope`].
///
/// Thread-safe via interior `RwLock`; wrapped in `Arc` and shared across the
/// application.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection in `scope`.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(
        &self,
        conn_id: String,
        scope: ChannelScope,
        user_id: Option<DbId>,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            scope,
            user_id,
            sender: tx,
            connected_at: chrono::Utc::now(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a connection by its ID.
    pub async fn remove(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    /// Send a message to every connection in `scope`.
    ///
    /// Returns the number of connections the message was queued for. Closed
    /// channels are skipped; their owners remove them on disconnect.
    pub async fn publish(&self, scope: ChannelScope, message: Message) -> usize {
        let conns = self.connections.read().await;
        let mut count = 0;
        for conn in conns.values().filter(|c| c.scope == scope) {
            if conn.sender.send(message.clone()).is_ok() {
                count += 1;
            }
        }
        count
    }

    /// Send a message to a single connection. Returns `false` if it is gone.
    pub async fn send_to(&self, conn_id: &str, message: Message) -> bool {
        self.connections
            .read()
            .await
            .get(conn_id)
            .is_some_and(|conn| conn.sender.send(message).is_ok())
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Number of connections listening on `scope`.
    pub async fn scope_count(&self, scope: ChannelScope) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter(|c| c.scope == scope)
            .count()
    }

    /// Send a Close frame to every connection, then clear the map.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every connected client.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
