//! Integration tests for the transactional reveal path.
//!
//! These drive [`RevealEngine`] directly against a real database and watch
//! the event bus to check that each reveal is announced exactly once.

use std::sync::Arc;

use chrono::{Duration, Utc};
use gallery_api::background::reveal_sweep::sweep_once;
use gallery_api::engine::{RevealEngine, ViewerInfo};
use gallery_core::milestones::ViewMilestones;
use gallery_core::notification::{NotificationEvent, NotificationKind};
use gallery_core::reveal::{RevealCondition, RevealPolicy};
use gallery_core::types::DbId;
use gallery_db::models::artwork::CreateArtwork;
use gallery_db::models::user::{CreateUser, User};
use gallery_db::repositories::{ArtworkRepo, ArtworkViewRepo, RevealConditionRepo, UserRepo};
use gallery_events::{EventBus, RevealNotifier};
use sqlx::PgPool;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn engine_with_bus(
    pool: &PgPool,
    policy: RevealPolicy,
) -> (RevealEngine, broadcast::Receiver<NotificationEvent>) {
    let bus = Arc::new(EventBus::default());
    let rx = bus.subscribe();
    let notifier = RevealNotifier::new(bus, ViewMilestones::default());
    (RevealEngine::new(pool.clone(), policy, notifier), rx)
}

async fn user(pool: &PgPool, username: &str, is_artist: bool) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@test.com"),
            password_hash: "not-a-real-hash".to_string(),
            is_artist,
            bio: None,
        },
    )
    .await
    .unwrap()
}

async fn artwork(pool: &PgPool, artist_id: DbId, conditions: &[RevealCondition]) -> DbId {
    let input = CreateArtwork {
        title: "Hidden Piece".to_string(),
        description: None,
        artist_id,
        content_type: "image/png".to_string(),
        placeholder_url: None,
    };
    ArtworkRepo::create_with_content(pool, &input, b"sealed", conditions)
        .await
        .unwrap()
        .id
}

fn viewer(user_id: DbId) -> ViewerInfo {
    ViewerInfo {
        user_id: Some(user_id),
        ip_address: Some("203.0.113.7".to_string()),
        user_agent: Some("integration-test".to_string()),
    }
}

/// Drain everything currently on the bus.
fn drain(rx: &mut broadcast::Receiver<NotificationEvent>) -> Vec<NotificationEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn reveal_events(events: &[NotificationEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e.kind, NotificationKind::ArtworkRevealed))
        .count()
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_hundredth_view_reveals_once(pool: PgPool) {
    let artist = user(&pool, "artist", true).await;
    let fan = user(&pool, "fan", false).await;
    let id = artwork(&pool, artist.id, &[RevealCondition::ViewCount { count: 100 }]).await;
    let (engine, mut rx) = engine_with_bus(&pool, RevealPolicy::Any);

    for _ in 0..99 {
        let outcome = engine.record_view(id, &viewer(fan.id)).await.unwrap();
        assert!(!outcome.revealed_now);
    }
    let stored = ArtworkRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert!(!stored.is_revealed);
    assert_eq!(stored.view_count, 99);

    let outcome = engine.record_view(id, &viewer(fan.id)).await.unwrap();
    assert!(outcome.revealed_now);
    assert!(outcome.artwork.is_revealed);
    assert_eq!(outcome.artwork.view_count, 100);
    assert!(outcome.milestone, "100 is a default milestone");

    // Later views never re-announce.
    let outcome = engine.record_view(id, &viewer(fan.id)).await.unwrap();
    assert!(!outcome.revealed_now);
    assert!(outcome.artwork.is_revealed);

    let events = drain(&mut rx);
    assert_eq!(reveal_events(&events), 1);
    let milestones: Vec<_> = events
        .iter()
        .filter_map(|e| match e.kind {
            NotificationKind::ViewMilestone { view_count } => Some(view_count),
            _ => None,
        })
        .collect();
    assert_eq!(milestones, vec![10, 50, 100]);

    assert_eq!(ArtworkViewRepo::count_for_artwork(&pool, id).await.unwrap(), 101);
    let conditions = RevealConditionRepo::list_for_artwork(&pool, id).await.unwrap();
    assert!(conditions[0].is_met);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_views_reveal_exactly_once(pool: PgPool) {
    let artist = user(&pool, "artist", true).await;
    let fan = user(&pool, "fan", false).await;
    let id = artwork(&pool, artist.id, &[RevealCondition::ViewCount { count: 3 }]).await;
    let (engine, mut rx) = engine_with_bus(&pool, RevealPolicy::Any);

    let info = viewer(fan.id);
    let (a, b, c, d, e, f) = tokio::join!(
        engine.record_view(id, &info),
        engine.record_view(id, &info),
        engine.record_view(id, &info),
        engine.record_view(id, &info),
        engine.record_view(id, &info),
        engine.record_view(id, &info),
    );
    let outcomes = [a, b, c, d, e, f].map(Result::unwrap);

    let revealers = outcomes.iter().filter(|o| o.revealed_now).count();
    assert_eq!(revealers, 1);

    // Every count 1..=6 was observed by exactly one request.
    let mut counts: Vec<i64> = outcomes.iter().map(|o| o.artwork.view_count).collect();
    counts.sort_unstable();
    assert_eq!(counts, vec![1, 2, 3, 4, 5, 6]);

    let revealer = outcomes.iter().find(|o| o.revealed_now).unwrap();
    assert_eq!(revealer.artwork.view_count, 3);

    assert_eq!(reveal_events(&drain(&mut rx)), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_missing_artwork_is_not_found(pool: PgPool) {
    let (engine, _rx) = engine_with_bus(&pool, RevealPolicy::Any);
    let err = engine.record_view(424242, &ViewerInfo::default()).await.unwrap_err();
    assert!(err.to_string().contains("not found"));
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_all_policy_needs_every_condition(pool: PgPool) {
    let artist = user(&pool, "artist", true).await;
    let fan = user(&pool, "fan", false).await;
    let id = artwork(
        &pool,
        artist.id,
        &[
            RevealCondition::ViewCount { count: 2 },
            RevealCondition::Interactive { comment_count: 1 },
        ],
    )
    .await;
    let (engine, mut rx) = engine_with_bus(&pool, RevealPolicy::All);

    engine.record_view(id, &viewer(fan.id)).await.unwrap();
    let outcome = engine.record_view(id, &viewer(fan.id)).await.unwrap();
    assert!(!outcome.revealed_now, "comment condition still unmet");

    let conditions = RevealConditionRepo::list_for_artwork(&pool, id).await.unwrap();
    assert!(conditions[0].is_met);
    assert!(!conditions[1].is_met);

    let outcome = engine.record_comment(id, fan.id, "lovely").await.unwrap();
    assert!(outcome.revealed_now);
    assert_eq!(outcome.comment_count, 1);
    assert_eq!(outcome.author_name, "fan");

    let events = drain(&mut rx);
    assert_eq!(reveal_events(&events), 1);
    assert!(events
        .iter()
        .any(|e| matches!(e.kind, NotificationKind::NewComment { .. })));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_any_policy_first_condition_wins(pool: PgPool) {
    let artist = user(&pool, "artist", true).await;
    let fan = user(&pool, "fan", false).await;
    let id = artwork(
        &pool,
        artist.id,
        &[
            RevealCondition::ViewCount { count: 50 },
            RevealCondition::Interactive { comment_count: 1 },
        ],
    )
    .await;
    let (engine, _rx) = engine_with_bus(&pool, RevealPolicy::Any);

    let outcome = engine.record_comment(id, fan.id, "first!").await.unwrap();
    assert!(outcome.revealed_now);
    assert!(ArtworkRepo::find_by_id(&pool, id).await.unwrap().unwrap().is_revealed);
}

// ---------------------------------------------------------------------------
// Time conditions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_sweep_reveals_due_time_conditions(pool: PgPool) {
    let artist = user(&pool, "artist", true).await;
    let due = artwork(
        &pool,
        artist.id,
        &[RevealCondition::Time {
            reveal_at: Utc::now() - Duration::minutes(5),
        }],
    )
    .await;
    let later = artwork(
        &pool,
        artist.id,
        &[RevealCondition::Time {
            reveal_at: Utc::now() + Duration::days(1),
        }],
    )
    .await;
    let (engine, mut rx) = engine_with_bus(&pool, RevealPolicy::Any);

    let revealed = sweep_once(&pool, &engine, Utc::now()).await.unwrap();
    assert_eq!(revealed, 1);
    assert!(ArtworkRepo::find_by_id(&pool, due).await.unwrap().unwrap().is_revealed);
    assert!(!ArtworkRepo::find_by_id(&pool, later).await.unwrap().unwrap().is_revealed);

    // A second pass finds nothing left to do.
    assert_eq!(sweep_once(&pool, &engine, Utc::now()).await.unwrap(), 0);

    let events = drain(&mut rx);
    assert_eq!(reveal_events(&events), 1);
    assert_eq!(events[0].artwork.id, due);
    assert_eq!(events[0].artwork.artist_name, "artist");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_sweep_skips_malformed_time_condition(pool: PgPool) {
    let artist = user(&pool, "artist", true).await;
    let poisoned = artwork(&pool, artist.id, &[RevealCondition::ViewCount { count: 50 }]).await;
    sqlx::query(
        "INSERT INTO reveal_conditions (artwork_id, condition_type, condition_value)
         VALUES ($1, 'time', $2)",
    )
    .bind(poisoned)
    .bind(serde_json::json!({"reveal_at": "-0001-01-01T00:00:00+00:00"}))
    .execute(&pool)
    .await
    .unwrap();
    let due = artwork(
        &pool,
        artist.id,
        &[RevealCondition::Time {
            reveal_at: Utc::now() - Duration::minutes(1),
        }],
    )
    .await;
    let (engine, _rx) = engine_with_bus(&pool, RevealPolicy::Any);

    let revealed = sweep_once(&pool, &engine, Utc::now()).await.unwrap();
    assert_eq!(revealed, 1);
    assert!(ArtworkRepo::find_by_id(&pool, due).await.unwrap().unwrap().is_revealed);
    assert!(!ArtworkRepo::find_by_id(&pool, poisoned).await.unwrap().unwrap().is_revealed);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_check_reveal_on_revealed_artwork_is_noop(pool: PgPool) {
    let artist = user(&pool, "artist", true).await;
    let id = artwork(
        &pool,
        artist.id,
        &[RevealCondition::Time {
            reveal_at: Utc::now() - Duration::minutes(1),
        }],
    )
    .await;
    let (engine, mut rx) = engine_with_bus(&pool, RevealPolicy::Any);

    assert!(engine.check_reveal(id, Utc::now()).await.unwrap());
    assert!(!engine.check_reveal(id, Utc::now()).await.unwrap());
    assert_eq!(reveal_events(&drain(&mut rx)), 1);
}
