#![allow(dead_code)]

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use procura_api::auth::jwt::{generate_access_token, JwtConfig};
use procura_api::auth::password::hash_password;
use procura_api::config::ServerConfig;
use procura_api::router::build_app_router;
use procura_api::state::AppState;
use procura_core::roles::Role;
use procura_core::store::UserStore;
use procura_core::types::DbId;
use procura_core::user::NewUser;

/// Password shared by every seeded account.
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 60,
        },
    }
}

/// Router plus the state behind it, so tests can seed the store directly.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

/// Build the full application router over a fresh in-memory store.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let state = AppState::in_memory(config.clone());
    TestApp {
        router: build_app_router(state.clone(), &config),
        state,
    }
}

impl TestApp {
    /// Insert a user and return its id and a valid bearer token.
    pub async fn seed_user(&self, name: &str, role: Role) -> (DbId, String) {
        let user = self
            .state
            .users
            .create(NewUser {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                password_hash: test_password_hash().to_string(),
                role,
            })
            .await
            .expect("seeding user should succeed");
        let token = generate_access_token(user.id, role.as_str(), &self.state.config.jwt)
            .expect("token generation should succeed");
        (user.id, token)
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Argon2 hashing is slow in debug builds; hash the shared password once.
fn test_password_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(TEST_PASSWORD).expect("hashing should succeed"))
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request should build");

    app.oneshot(request).await.expect("router is infallible")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PATCH, uri, Some(token), Some(body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be valid JSON")
}

/// Assert the status and the `code` field of a JSON error response.
pub async fn assert_error(response: Response<Body>, status: StatusCode, code: &str) {
    assert_eq!(response.status(), status);
    let json = body_json(response).await;
    assert_eq!(json["code"], code, "unexpected error body: {json}");
    assert!(json["error"].is_string());
}

/// Create an RFP over HTTP and return its id.
pub async fn create_rfp(app: &TestApp, token: &str, title: &str, amount: f64) -> DbId {
    let body = serde_json::json!({
        "title": title,
        "description": format!("{title} for the new office"),
        "amount": amount,
        "submission_deadline": "2030-06-30",
    });
    let response = post_json_auth(app.router(), "/api/v1/rfps", body, token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"]
        .as_i64()
        .expect("created RFP should have an id")
}
