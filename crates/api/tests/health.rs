//! Health endpoint and middleware behaviour.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{assert_error, body_json, get, post_json};
use procura_api::router::{build_app_router, MAX_BODY_BYTES};
use procura_api::state::AppState;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_health_reports_memory_store() {
    let app = common::build_test_app();

    let response = get(app.router(), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["store"], "memory");
    assert_eq!(json["db_healthy"], true);
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_request_id_is_set_on_response() {
    let app = common::build_test_app();

    let response = get(app.router(), "/health").await;
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = common::build_test_app();

    let response = get(app.router(), "/api/v1/nope").await;
    assert_error(response, StatusCode::NOT_FOUND, "NOT_FOUND").await;
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let app = common::build_test_app();

    let body = json!({
        "name": "x".repeat(MAX_BODY_BYTES),
        "email": "big@example.com",
        "password": "long-enough-password",
    });
    let response = post_json(app.router(), "/api/v1/auth/register", body).await;
    assert_error(response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await;
}

async fn allowed_origin(origins: &[&str], origin: &str) -> Option<String> {
    let mut config = common::test_config();
    config.cors_origins = origins.iter().map(|o| o.to_string()).collect();
    let router = build_app_router(AppState::in_memory(config.clone()), &config);

    let request = Request::builder()
        .uri("/health")
        .header("origin", origin)
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    response
        .headers()
        .get("access-control-allow-origin")
        .map(|v| v.to_str().unwrap().to_string())
}

#[tokio::test]
async fn test_cors_origins() {
    assert_eq!(
        allowed_origin(&["http://localhost:5173"], "http://localhost:5173").await,
        Some("http://localhost:5173".to_string())
    );
    assert_eq!(
        allowed_origin(&["http://localhost:5173"], "http://evil.test").await,
        None
    );
    assert_eq!(
        allowed_origin(&["*"], "http://anywhere.test").await,
        Some("*".to_string())
    );
}
