use std::sync::Arc;

use gallery_core::content::ContentCipher;
use gallery_core::error::CoreError;
use gallery_events::{EventBus, RevealNotifier};

use crate::config::ServerConfig;
use crate::engine::RevealEngine;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; inner data is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: gallery_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// WebSocket connection registry (artwork and user scopes).
    pub ws_manager: Arc<WsManager>,
    /// In-process bus carrying notification events to the router.
    pub event_bus: Arc<EventBus>,
    /// Transactional view/comment/reveal path.
    pub reveal_engine: Arc<RevealEngine>,
    /// Encrypts uploads and decrypts revealed content.
    pub cipher: Arc<ContentCipher>,
}

impl AppState {
    /// Wire the reveal engine, notifier and cipher from configuration.
    pub fn new(
        pool: gallery_db::DbPool,
        config: ServerConfig,
        ws_manager: Arc<WsManager>,
        event_bus: Arc<EventBus>,
    ) -> Result<Self, CoreError> {
        let cipher = ContentCipher::from_secret(&config.content_encryption_key)?;
        let notifier = RevealNotifier::new(Arc::clone(&event_bus), config.view_milestones.clone());
        let reveal_engine = RevealEngine::new(pool.clone(), config.reveal_policy, notifier);

        Ok(Self {
            pool,
            config: Arc::new(config),
            ws_manager,
            event_bus,
            reveal_engine: Arc::new(reveal_engine),
            cipher: Arc::new(cipher),
        })
    }
}
