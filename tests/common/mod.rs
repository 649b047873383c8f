#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use reelauth::{
    ServerConfig,
    auth::hash_password,
    config::{AuthConfig, DEFAULT_COOKIE_NAME},
    create_app,
    db::{Database, NewUser},
};
use std::sync::OnceLock;

pub const SECRET: &[u8] = b"integration-test-secret-key-0123456789";
pub const ISSUER: &str = "reelauth.test";
pub const AUDIENCE: &str = "reelauth.client";
pub const COOKIE_NAME: &str = DEFAULT_COOKIE_NAME;

pub const EMAIL: &str = "ada@example.com";
pub const PASSWORD: &str = "analytical-engine";

/// Argon2 is slow in debug builds; hash the shared password once.
fn password_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(PASSWORD).expect("Failed to hash password"))
}

pub fn auth_config() -> AuthConfig {
    AuthConfig::new(ISSUER, AUDIENCE, SECRET)
}

/// Create a test app backed by an in-memory database.
pub async fn create_test_app(single_use_refresh: bool) -> (Router, Database) {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let config = ServerConfig {
        db: db.clone(),
        auth: auth_config().validate().expect("Invalid test config"),
        single_use_refresh,
    };
    (create_app(&config), db)
}

/// Create Ada Lovelace with the shared password and return her id.
pub async fn seed_user(db: &Database) -> i64 {
    db.users()
        .create(&NewUser {
            email: EMAIL,
            first_name: "Ada",
            last_name: "Lovelace",
            password_hash: password_hash(),
        })
        .await
        .expect("Failed to create user")
}

pub fn login_request(email: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/authenticate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({ "email": email, "password": password }).to_string(),
        ))
        .unwrap()
}

pub fn refresh_request(cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri("/api/refresh");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn session_cookie(refresh_token: &str) -> String {
    format!("{}={}", COOKIE_NAME, refresh_token)
}

/// Extract Set-Cookie headers from response
pub fn extract_set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}

/// Value of the session cookie set by the response, if any.
pub fn set_session_value(response: &Response<Body>) -> Option<String> {
    let prefix = format!("{}=", COOKIE_NAME);
    extract_set_cookies(response).iter().find_map(|c| {
        c.strip_prefix(&prefix)
            .map(|rest| rest.split(';').next().unwrap_or("").to_string())
    })
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

/// Log in as the seeded user and return (access token, refresh token).
pub async fn login(app: &Router) -> (String, String) {
    use tower::ServiceExt;

    let response = app
        .clone()
        .oneshot(login_request(EMAIL, PASSWORD))
        .await
        .unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    let body = body_json(response).await;
    (
        body["token"].as_str().unwrap().to_string(),
        body["refresh_token"].as_str().unwrap().to_string(),
    )
}
