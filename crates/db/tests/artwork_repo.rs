//! Integration tests for the artwork, condition, comment and view repositories.
//!
//! Exercises the repository layer against a real database:
//! - Atomic artwork creation with content and conditions
//! - Listing visibility (revealed-only vs. artist's own)
//! - The reveal transaction primitives (lock, increment, mark_revealed)
//! - The time-sweep candidate query and condition replacement

use chrono::{Duration, Utc};
use gallery_core::reveal::RevealCondition;
use gallery_db::models::artwork::{CreateArtwork, UpdateArtwork};
use gallery_db::models::artwork_view::CreateArtworkView;
use gallery_db::models::comment::CreateComment;
use gallery_db::models::user::CreateUser;
use gallery_db::repositories::{
    ArtworkRepo, ArtworkViewRepo, CommentRepo, RevealConditionRepo, UserRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn create_user(pool: &PgPool, username: &str, is_artist: bool) -> i64 {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "not-a-real-hash".to_string(),
            is_artist,
            bio: None,
        },
    )
    .await
    .unwrap()
    .id
}

fn new_artwork(artist_id: i64, title: &str) -> CreateArtwork {
    CreateArtwork {
        title: title.to_string(),
        description: Some(format!("{title} description")),
        artist_id,
        content_type: "image/png".to_string(),
        placeholder_url: None,
    }
}

async fn create_artwork(
    pool: &PgPool,
    artist_id: i64,
    title: &str,
    conditions: &[RevealCondition],
) -> i64 {
    ArtworkRepo::create_with_content(pool, &new_artwork(artist_id, title), b"sealed", conditions)
        .await
        .unwrap()
        .id
}

async fn reveal(pool: &PgPool, id: i64) {
    let mut conn = pool.acquire().await.unwrap();
    assert!(ArtworkRepo::mark_revealed(&mut conn, id).await.unwrap());
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_with_content_stores_conditions_and_blob(pool: PgPool) {
    let artist = create_user(&pool, "ada", true).await;
    let conditions = [
        RevealCondition::ViewCount { count: 5 },
        RevealCondition::Interactive { comment_count: 2 },
    ];
    let id = create_artwork(&pool, artist, "Dawn", &conditions).await;

    let artwork = ArtworkRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(artwork.title, "Dawn");
    assert!(!artwork.is_revealed);
    assert_eq!(artwork.view_count, 0);

    let content = ArtworkRepo::find_content(&pool, id).await.unwrap().unwrap();
    assert_eq!(content.encrypted_content, b"sealed");
    assert_eq!(content.size_bytes, 6);

    let rows = RevealConditionRepo::list_for_artwork(&pool, id).await.unwrap();
    let parsed: Vec<RevealCondition> = rows.iter().map(|r| r.to_condition().unwrap()).collect();
    assert_eq!(parsed, conditions);
    assert!(rows.iter().all(|r| !r.is_met));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn time_condition_round_trips_through_jsonb(pool: PgPool) {
    let artist = create_user(&pool, "ada", true).await;
    let reveal_at = Utc::now() + Duration::hours(3);
    let condition = RevealCondition::Time { reveal_at };
    let id = create_artwork(&pool, artist, "Later", &[condition]).await;

    let rows = RevealConditionRepo::list_for_artwork(&pool, id).await.unwrap();
    assert_eq!(rows[0].condition_type, "time");
    match rows[0].to_condition().unwrap() {
        RevealCondition::Time { reveal_at: stored } => {
            assert_eq!(stored.timestamp(), reveal_at.timestamp());
        }
        other => panic!("expected time condition, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_revealed_hides_unrevealed_and_filters_by_search(pool: PgPool) {
    let artist = create_user(&pool, "ada", true).await;
    let hidden = create_artwork(&pool, artist, "Hidden Sea", &[]).await;
    let shown = create_artwork(&pool, artist, "Open Sky", &[]).await;
    let other = create_artwork(&pool, artist, "Open Sea", &[]).await;
    reveal(&pool, shown).await;
    reveal(&pool, other).await;

    let all = ArtworkRepo::list_revealed(&pool, None, 50, 0).await.unwrap();
    let ids: Vec<i64> = all.iter().map(|a| a.id).collect();
    assert!(!ids.contains(&hidden));
    assert_eq!(ids.len(), 2);
    assert_eq!(all[0].artist_username, "ada");

    let sea = ArtworkRepo::list_revealed(&pool, Some("sea"), 50, 0).await.unwrap();
    assert_eq!(sea.len(), 1);
    assert_eq!(sea[0].id, other);

    let blank = ArtworkRepo::list_revealed(&pool, Some("  "), 50, 0).await.unwrap();
    assert_eq!(blank.len(), 2);

    let paged = ArtworkRepo::list_revealed(&pool, None, 1, 1).await.unwrap();
    assert_eq!(paged.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_by_artist_respects_include_hidden(pool: PgPool) {
    let artist = create_user(&pool, "ada", true).await;
    let hidden = create_artwork(&pool, artist, "Hidden", &[]).await;
    let shown = create_artwork(&pool, artist, "Shown", &[]).await;
    reveal(&pool, shown).await;

    let own = ArtworkRepo::list_by_artist(&pool, artist, true).await.unwrap();
    assert_eq!(own.len(), 2);

    let public = ArtworkRepo::list_by_artist(&pool, artist, false).await.unwrap();
    assert_eq!(public.len(), 1);
    assert_eq!(public[0].id, shown);
    assert_ne!(public[0].id, hidden);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn find_item_counts_comments(pool: PgPool) {
    let artist = create_user(&pool, "ada", true).await;
    let viewer = create_user(&pool, "bob", false).await;
    let id = create_artwork(&pool, artist, "Talky", &[]).await;

    let mut conn = pool.acquire().await.unwrap();
    for text in ["first", "second"] {
        CommentRepo::create(
            &mut conn,
            &CreateComment {
                artwork_id: id,
                user_id: viewer,
                content: text.to_string(),
            },
        )
        .await
        .unwrap();
    }
    drop(conn);

    let item = ArtworkRepo::find_item(&pool, id).await.unwrap().unwrap();
    assert_eq!(item.comment_count, 2);
    assert_eq!(CommentRepo::count_for_artwork(&pool, id).await.unwrap(), 2);

    let comments = CommentRepo::list_for_artwork(&pool, id, 10, 0).await.unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].content, "second");
    assert_eq!(comments[0].username, "bob");
}

// ---------------------------------------------------------------------------
// Update / delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_changes_only_given_fields(pool: PgPool) {
    let artist = create_user(&pool, "ada", true).await;
    let id = create_artwork(&pool, artist, "Draft", &[]).await;

    let updated = ArtworkRepo::update(
        &pool,
        id,
        &UpdateArtwork {
            title: Some("Final".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.title, "Final");
    assert_eq!(updated.description.as_deref(), Some("Draft description"));

    let cleared = ArtworkRepo::update(
        &pool,
        id,
        &UpdateArtwork {
            description: Some(String::new()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(cleared.title, "Final");
    assert_eq!(cleared.description, None);

    assert!(ArtworkRepo::update(&pool, 999_999, &UpdateArtwork::default())
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_cascades_to_children(pool: PgPool) {
    let artist = create_user(&pool, "ada", true).await;
    let id = create_artwork(
        &pool,
        artist,
        "Gone",
        &[RevealCondition::ViewCount { count: 1 }],
    )
    .await;

    assert!(ArtworkRepo::delete(&pool, id).await.unwrap());
    assert!(!ArtworkRepo::delete(&pool, id).await.unwrap());
    assert!(ArtworkRepo::find_content(&pool, id).await.unwrap().is_none());
    assert!(RevealConditionRepo::list_for_artwork(&pool, id)
        .await
        .unwrap()
        .is_empty());
}

// ---------------------------------------------------------------------------
// Reveal transaction primitives
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn increment_and_record_view(pool: PgPool) {
    let artist = create_user(&pool, "ada", true).await;
    let id = create_artwork(&pool, artist, "Counted", &[]).await;

    let mut tx = pool.begin().await.unwrap();
    let locked = ArtworkRepo::lock_for_update(&mut *tx, id).await.unwrap().unwrap();
    assert_eq!(locked.view_count, 0);
    assert_eq!(ArtworkRepo::increment_view_count(&mut *tx, id).await.unwrap(), 1);
    assert_eq!(ArtworkRepo::increment_view_count(&mut *tx, id).await.unwrap(), 2);
    ArtworkViewRepo::create(
        &mut *tx,
        &CreateArtworkView {
            artwork_id: id,
            ip_address: Some("127.0.0.1".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(ArtworkViewRepo::count_for_artwork(&pool, id).await.unwrap(), 1);
    let artwork = ArtworkRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(artwork.view_count, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn mark_revealed_transitions_once(pool: PgPool) {
    let artist = create_user(&pool, "ada", true).await;
    let id = create_artwork(&pool, artist, "Once", &[]).await;

    let mut conn = pool.acquire().await.unwrap();
    assert!(ArtworkRepo::mark_revealed(&mut conn, id).await.unwrap());
    assert!(!ArtworkRepo::mark_revealed(&mut conn, id).await.unwrap());
    assert!(!ArtworkRepo::mark_revealed(&mut conn, 999_999).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn mark_met_skips_already_met(pool: PgPool) {
    let artist = create_user(&pool, "ada", true).await;
    let id = create_artwork(
        &pool,
        artist,
        "Met",
        &[
            RevealCondition::ViewCount { count: 1 },
            RevealCondition::Interactive { comment_count: 1 },
        ],
    )
    .await;
    let rows = RevealConditionRepo::list_for_artwork(&pool, id).await.unwrap();

    let mut conn = pool.acquire().await.unwrap();
    assert_eq!(RevealConditionRepo::mark_met(&mut conn, &[rows[0].id]).await.unwrap(), 1);
    let all: Vec<i64> = rows.iter().map(|r| r.id).collect();
    assert_eq!(RevealConditionRepo::mark_met(&mut conn, &all).await.unwrap(), 1);
    assert_eq!(RevealConditionRepo::mark_met(&mut conn, &[]).await.unwrap(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn pending_time_query_skips_revealed_and_non_time(pool: PgPool) {
    let artist = create_user(&pool, "ada", true).await;
    let now = Utc::now();
    let past = RevealCondition::Time {
        reveal_at: now - Duration::minutes(5),
    };
    let future = RevealCondition::Time {
        reveal_at: now + Duration::hours(1),
    };

    let due = create_artwork(&pool, artist, "Due", &[past]).await;
    let not_yet = create_artwork(&pool, artist, "Not yet", &[future]).await;
    let views_only =
        create_artwork(&pool, artist, "Views", &[RevealCondition::ViewCount { count: 1 }]).await;
    let already = create_artwork(&pool, artist, "Already", &[past]).await;
    reveal(&pool, already).await;

    let rows = RevealConditionRepo::list_pending_time(&pool).await.unwrap();
    let ids: Vec<i64> = rows.iter().map(|r| r.artwork_id).collect();
    assert_eq!(ids, vec![due, not_yet]);
    assert!(!ids.contains(&views_only));
    assert!(!ids.contains(&already));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn replace_conditions_swaps_all_rows(pool: PgPool) {
    let artist = create_user(&pool, "ada", true).await;
    let id = create_artwork(
        &pool,
        artist,
        "Swap",
        &[
            RevealCondition::ViewCount { count: 10 },
            RevealCondition::Interactive { comment_count: 2 },
        ],
    )
    .await;

    let mut tx = pool.begin().await.unwrap();
    let rows = RevealConditionRepo::replace_for_artwork(
        &mut *tx,
        id,
        &[RevealCondition::ViewCount { count: 3 }],
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(rows.len(), 1);
    let stored = RevealConditionRepo::list_for_artwork(&pool, id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(
        stored[0].to_condition().unwrap(),
        RevealCondition::ViewCount { count: 3 }
    );
}
