#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use gallery_core::milestones::ViewMilestones;
use gallery_core::reveal::RevealPolicy;
use gallery_db::models::user::{CreateUser, User};
use gallery_db::repositories::UserRepo;
use gallery_events::EventBus;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use gallery_api::auth::jwt::{generate_access_token, JwtConfig};
use gallery_api::auth::password::hash_password;
use gallery_api::config::ServerConfig;
use gallery_api::router::build_app_router;
use gallery_api::state::AppState;
use gallery_api::ws::WsManager;

/// Plaintext password of every user made by [`create_user`].
pub const TEST_PASSWORD: &str = "test_password_123!";

/// Boundary used by [`multipart_body`].
pub const BOUNDARY: &str = "gallery-test-boundary";

/// Build a test `ServerConfig` with safe defaults and no background sweep.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-jwt-secret".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
        reveal_policy: RevealPolicy::Any,
        view_milestones: ViewMilestones::default(),
        reveal_sweep_interval_secs: 0,
        content_encryption_key: "test-content-key".to_string(),
        max_upload_bytes: 1024 * 1024,
    }
}

/// Application state wired the same way `main.rs` does it.
pub fn test_state(pool: PgPool, config: ServerConfig) -> AppState {
    AppState::new(
        pool,
        config,
        Arc::new(WsManager::new()),
        Arc::new(EventBus::default()),
    )
    .expect("test state should build")
}

/// Build the full application router with all middleware layers.
pub fn build_test_app(pool: PgPool) -> Router {
    let state = test_state(pool, test_config());
    app_for_state(state)
}

pub fn app_for_state(state: AppState) -> Router {
    let config = Arc::clone(&state.config);
    build_app_router(state, &config)
}

/// Insert a user and mint an access token for them.
pub async fn create_user(pool: &PgPool, username: &str, is_artist: bool) -> (User, String) {
    let input = CreateUser {
        username: username.to_string(),
        email: format!("{username}@test.com"),
        password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
        is_artist,
        bio: None,
    };
    let user = UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed");
    let token = generate_access_token(user.id, user.role(), &test_config().jwt)
        .expect("token generation should succeed");
    (user, token)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes()
        .to_vec()
}

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.expect("request should complete")
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request should build");
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, json_request(Method::POST, uri, None, body)).await
}

pub async fn post_json_auth(app: Router, uri: &str, body: serde_json::Value, token: &str) -> Response {
    send(app, json_request(Method::POST, uri, Some(token), body)).await
}

pub async fn put_json_auth(app: Router, uri: &str, body: serde_json::Value, token: &str) -> Response {
    send(app, json_request(Method::PUT, uri, Some(token), body)).await
}

pub async fn patch_json_auth(app: Router, uri: &str, body: serde_json::Value, token: &str) -> Response {
    send(app, json_request(Method::PATCH, uri, Some(token), body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request should build");
    send(app, request).await
}

// ---------------------------------------------------------------------------
// Multipart
// ---------------------------------------------------------------------------

/// A multipart part: `(name, Some((filename, content_type)), bytes)`.
pub type Part<'a> = (&'a str, Option<(&'a str, &'a str)>, &'a [u8]);

/// Encode parts as a `multipart/form-data` body using [`BOUNDARY`].
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file {
            Some((filename, content_type)) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
            }
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_multipart_auth(app: Router, uri: &str, parts: &[Part<'_>], token: &str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(multipart_body(parts)))
        .expect("request should build");
    send(app, request).await
}

/// Upload a PNG-typed artwork with the given JSON condition list and return
/// the created artwork id.
pub async fn upload_artwork(
    app: Router,
    token: &str,
    title: &str,
    conditions: serde_json::Value,
    content: &[u8],
) -> i64 {
    let conditions = conditions.to_string();
    let parts: Vec<Part<'_>> = vec![
        ("title", None, title.as_bytes()),
        ("description", None, b"test artwork".as_slice()),
        ("reveal_conditions", None, conditions.as_bytes()),
        ("artwork_file", Some(("art.png", "image/png")), content),
    ];
    let response = post_multipart_auth(app, "/api/v1/artworks", &parts, token).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    let json = body_json(response).await;
    json["data"]["id"].as_i64().expect("created artwork id")
}
