//! Integration tests for users and refresh-token sessions.

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use gallery_db::models::session::CreateSession;
use gallery_db::models::user::{CreateUser, UpdateProfile};
use gallery_db::repositories::{SessionRepo, UserRepo};
use sqlx::PgPool;

fn new_user(username: &str, email: &str) -> CreateUser {
    CreateUser {
        username: username.to_string(),
        email: email.to_string(),
        password_hash: "hash".to_string(),
        is_artist: false,
        bio: None,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_and_find_user(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("carol", "carol@example.com"))
        .await
        .unwrap();
    assert!(user.is_active);
    assert_eq!(user.role(), "viewer");

    let found = UserRepo::find_by_username(&pool, "carol").await.unwrap().unwrap();
    assert_eq!(found.id, user.id);
    assert_eq!(
        UserRepo::find_username(&pool, user.id).await.unwrap().as_deref(),
        Some("carol")
    );
    assert!(UserRepo::find_by_id(&pool, 424_242).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_username_violates_named_constraint(pool: PgPool) {
    UserRepo::create(&pool, &new_user("dup", "a@example.com"))
        .await
        .unwrap();
    let err = UserRepo::create(&pool, &new_user("dup", "b@example.com"))
        .await
        .unwrap_err();
    assert_matches!(
        err,
        sqlx::Error::Database(ref db) if db.constraint() == Some("uq_users_username")
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn sessions_can_be_revoked(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("dave", "dave@example.com"))
        .await
        .unwrap();
    let session = SessionRepo::create(
        &pool,
        &CreateSession {
            user_id: user.id,
            refresh_token_hash: "abc123".to_string(),
            expires_at: Utc::now() + Duration::days(7),
        },
    )
    .await
    .unwrap();

    let found = SessionRepo::find_by_refresh_token_hash(&pool, "abc123")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, session.id);

    SessionRepo::revoke_all_for_user(&pool, user.id).await.unwrap();
    assert!(SessionRepo::find_by_refresh_token_hash(&pool, "abc123")
        .await
        .unwrap()
        .is_none());
    assert!(!SessionRepo::revoke(&pool, session.id).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn purge_removes_revoked_and_expired_sessions(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("erin", "erin@example.com"))
        .await
        .unwrap();
    let now = Utc::now();
    let session = |hash: &str, expires_at| CreateSession {
        user_id: user.id,
        refresh_token_hash: hash.to_string(),
        expires_at,
    };
    SessionRepo::create(&pool, &session("live", now + Duration::days(7)))
        .await
        .unwrap();
    SessionRepo::create(&pool, &session("expired", now - Duration::minutes(1)))
        .await
        .unwrap();
    let revoked = SessionRepo::create(&pool, &session("revoked", now + Duration::days(7)))
        .await
        .unwrap();
    assert!(SessionRepo::revoke(&pool, revoked.id).await.unwrap());

    assert_eq!(SessionRepo::purge_stale(&pool, now).await.unwrap(), 2);
    assert_eq!(SessionRepo::purge_stale(&pool, now).await.unwrap(), 0);
    assert!(SessionRepo::find_by_refresh_token_hash(&pool, "live")
        .await
        .unwrap()
        .is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn profile_and_password_updates(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("fay", "fay@example.com"))
        .await
        .unwrap();

    let updated = UserRepo::update_profile(
        &pool,
        user.id,
        &UpdateProfile {
            bio: Some("printmaker".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.username, "fay");
    assert_eq!(updated.bio.as_deref(), Some("printmaker"));

    let cleared = UserRepo::update_profile(
        &pool,
        user.id,
        &UpdateProfile {
            bio: Some(String::new()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(cleared.bio, None);

    assert!(UserRepo::update_password(&pool, user.id, "new-hash").await.unwrap());
    let reloaded = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(reloaded.password_hash, "new-hash");
    assert!(!UserRepo::update_password(&pool, 424_242, "x").await.unwrap());
}
