use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gallery_api::config::ServerConfig;
use gallery_api::notifications::NotificationRouter;
use gallery_api::router::build_app_router;
use gallery_api::{background, state, ws};
use gallery_events::EventBus;

use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gallery_api=debug,gallery_events=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        reveal_policy = %config.reveal_policy,
        "Loaded server configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = gallery_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    gallery_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    gallery_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- WebSocket manager + heartbeat ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let heartbeat_cancel = CancellationToken::new();
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager), heartbeat_cancel.clone());

    // --- Event bus + notification router ---
    let event_bus = Arc::new(EventBus::default());
    let notification_router = NotificationRouter::new(Arc::clone(&ws_manager));
    let router_handle = tokio::spawn(notification_router.run(event_bus.subscribe()));
    tracing::info!("Notification router started");

    // --- App state ---
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    let sweep_interval_secs = config.reveal_sweep_interval_secs;
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    let state = AppState::new(pool, config, Arc::clone(&ws_manager), Arc::clone(&event_bus))
        .expect("Failed to initialise application state");

    // --- Time-condition sweep ---
    let sweep_cancel = CancellationToken::new();
    let sweep_handle = (sweep_interval_secs > 0).then(|| {
        tokio::spawn(background::reveal_sweep::run(
            state.pool.clone(),
            Arc::clone(&state.reveal_engine),
            Duration::from_secs(sweep_interval_secs),
            sweep_cancel.clone(),
        ))
    });

    // --- Router ---
    let config = Arc::clone(&state.config);
    let app = build_app_router(state, &config);

    // --- Start server ---
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    sweep_cancel.cancel();
    if let Some(handle) = sweep_handle {
        let _ = tokio::time::timeout(shutdown_timeout, handle).await;
        tracing::info!("Reveal sweep stopped");
    }

    // The router exits once every sender is gone. `app` (and with it the
    // state's clone of the bus) was consumed by `serve`.
    drop(event_bus);
    let _ = tokio::time::timeout(shutdown_timeout, router_handle).await;
    tracing::info!("Notification router shut down");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    heartbeat_cancel.cancel();
    let _ = tokio::time::timeout(shutdown_timeout, heartbeat_handle).await;
    tracing::info!("Heartbeat task stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
