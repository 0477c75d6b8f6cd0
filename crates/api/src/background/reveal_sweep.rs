//! Periodic reveal of artworks whose time condition has come due.
//!
//! Views and comments evaluate conditions as they happen, but a time
//! condition can become true while nobody is looking. This job finds hidden
//! artworks with a due `time` condition and runs them through
//! [`RevealEngine::check_reveal`] so watchers are notified promptly.
//!
//! Each tick also drops refresh sessions that were revoked or have expired.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use gallery_core::reveal::RevealCondition;
use gallery_core::types::Timestamp;
use gallery_db::repositories::{RevealConditionRepo, SessionRepo};
use gallery_db::DbPool;
use tokio_util::sync::CancellationToken;

use crate::engine::RevealEngine;
use crate::error::AppResult;

/// Evaluate every artwork with a due time condition at `now`.
///
/// Returns how many artworks this pass revealed. A malformed stored
/// condition or a failure on one artwork is logged and does not stop the
/// pass.
pub async fn sweep_once(pool: &DbPool, engine: &RevealEngine, now: Timestamp) -> AppResult<usize> {
    let pending = RevealConditionRepo::list_pending_time(pool).await?;
    let mut due = BTreeSet::new();
    for row in &pending {
        match row.to_condition() {
            Ok(RevealCondition::Time { reveal_at }) if reveal_at <= now => {
                due.insert(row.artwork_id);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    artwork_id = row.artwork_id,
                    condition_id = row.id,
                    error = %e,
                    "Reveal sweep: skipping malformed time condition"
                );
            }
        }
    }

    let mut revealed = 0;
    for artwork_id in due {
        match engine.check_reveal(artwork_id, now).await {
            Ok(true) => revealed += 1,
            Ok(false) => {}
            Err(e) => {
                tracing::error!(artwork_id, error = %e, "Reveal sweep: check failed");
            }
        }
    }
    Ok(revealed)
}

/// Run the sweep loop every `interval` until `cancel` is triggered.
pub async fn run(
    pool: DbPool,
    engine: Arc<RevealEngine>,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs = interval.as_secs(), "Reveal sweep started");

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Reveal sweep stopping");
                break;
            }
            _ = ticker.tick() => {
                let now = Utc::now();
                match sweep_once(&pool, &engine, now).await {
                    Ok(0) => tracing::debug!("Reveal sweep: nothing due"),
                    Ok(revealed) => tracing::info!(revealed, "Reveal sweep: revealed artworks"),
                    Err(e) => tracing::error!(error = %e, "Reveal sweep: query failed"),
                }
                match SessionRepo::purge_stale(&pool, now).await {
                    Ok(0) => {}
                    Ok(purged) => tracing::debug!(purged, "Reveal sweep: purged stale sessions"),
                    Err(e) => tracing::error!(error = %e, "Reveal sweep: session purge failed"),
                }
            }
        }
    }
}
