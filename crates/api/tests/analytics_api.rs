//! HTTP-level tests for the `/analytics` dashboards.

mod common;

use axum::http::StatusCode;
use common::{assert_error, body_json, create_rfp, get_auth, patch_json_auth, TestApp};
use procura_core::roles::Role;
use procura_core::types::DbId;
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Seeded {
    app: TestApp,
    admin: String,
    acme_id: DbId,
    acme: String,
    globex_id: DbId,
}

async fn set_status(app: &TestApp, token: &str, id: DbId, status: &str) {
    let uri = format!("/api/v1/rfps/{id}");
    let response = patch_json_auth(app.router(), &uri, json!({ "status": status }), token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

/// Acme: 1000 Awarded, 500 Submitted. Globex: 3000 Awarded, 100 Draft.
async fn seeded() -> Seeded {
    let app = common::build_test_app();
    let (_, admin) = app.seed_user("Admin", Role::Admin).await;
    let (acme_id, acme) = app.seed_user("Acme", Role::Vendor).await;
    let (globex_id, globex) = app.seed_user("Globex", Role::Vendor).await;

    let a1 = create_rfp(&app, &acme, "Desks", 1000.0).await;
    let a2 = create_rfp(&app, &acme, "Chairs", 500.0).await;
    let g1 = create_rfp(&app, &globex, "Laptops", 3000.0).await;
    create_rfp(&app, &globex, "Cables", 100.0).await;

    set_status(&app, &admin, a1, "Awarded").await;
    set_status(&app, &acme, a2, "Submitted").await;
    set_status(&app, &admin, g1, "Awarded").await;

    Seeded {
        app,
        admin,
        acme_id,
        acme,
        globex_id,
    }
}

// ---------------------------------------------------------------------------
// Test: admin-only reports
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_admin_reports_reject_vendors() {
    let s = seeded().await;

    for uri in [
        "/api/v1/analytics/admin/overview",
        "/api/v1/analytics/spending/monthly",
        "/api/v1/analytics/rfp-status",
        "/api/v1/analytics/top-vendors",
        "/api/v1/analytics/vendor-performance",
    ] {
        let response = get_auth(s.app.router(), uri, &s.acme).await;
        assert_error(response, StatusCode::FORBIDDEN, "FORBIDDEN").await;
    }
}

#[tokio::test]
async fn test_overview() {
    let s = seeded().await;

    let response = get_auth(s.app.router(), "/api/v1/analytics/admin/overview", &s.admin).await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["total_procurement_value"], 4000.0);
    assert_eq!(data["vendor_count"], 2);
    let summary = &data["rfp_status_summary"];
    assert_eq!(summary["Draft"], 1);
    assert_eq!(summary["Submitted"], 1);
    assert_eq!(summary["Awarded"], 2);
    assert_eq!(summary["Rejected"], 0);
    assert_eq!(data["recent_rfps"].as_array().unwrap().len(), 4);
    assert!(data["recent_rfps"][0]["vendor"]["name"].is_string());
}

#[tokio::test]
async fn test_monthly_spending_has_twelve_months() {
    let s = seeded().await;

    let response = get_auth(s.app.router(), "/api/v1/analytics/spending/monthly", &s.admin).await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["monthly_spending"].as_array().unwrap().len(), 12);
    assert_eq!(data["total_spend"], 4000.0);
    assert_eq!(data["total_count"], 2);

    let response = get_auth(
        s.app.router(),
        "/api/v1/analytics/spending/monthly?year=2001",
        &s.admin,
    )
    .await;
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["year"], 2001);
    assert_eq!(data["total_spend"], 0.0);

    let response = get_auth(
        s.app.router(),
        "/api/v1/analytics/spending/monthly?year=1800",
        &s.admin,
    )
    .await;
    assert_error(response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await;
}

#[tokio::test]
async fn test_status_breakdown_percentages() {
    let s = seeded().await;

    let response = get_auth(s.app.router(), "/api/v1/analytics/rfp-status", &s.admin).await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["total_stats"]["total_count"], 4);
    assert_eq!(data["total_stats"]["total_value"], 4600.0);

    let details = data["details"].as_array().unwrap();
    let by_count: f64 = details
        .iter()
        .map(|d| d["percentage_by_count"].as_f64().unwrap())
        .sum();
    assert!((by_count - 100.0).abs() < 0.5);
    assert_eq!(details[0]["status"], "Awarded");
}

#[tokio::test]
async fn test_top_vendors_and_performance() {
    let s = seeded().await;

    let response = get_auth(
        s.app.router(),
        "/api/v1/analytics/top-vendors?limit=1&metric=value",
        &s.admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["metric"], "value");
    let top = data["top_vendors"].as_array().unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0]["id"], s.globex_id);
    assert_eq!(top[0]["name"], "Globex");
    let recent = top[0]["recent_rfps"].as_array().unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0]["title"], "Laptops");
    assert_eq!(recent[0]["amount"], 3000.0);

    let response = get_auth(
        s.app.router(),
        "/api/v1/analytics/top-vendors?limit=500",
        &s.admin,
    )
    .await;
    assert_error(response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await;

    let response = get_auth(
        s.app.router(),
        "/api/v1/analytics/vendor-performance",
        &s.admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let rows = body_json(response).await["data"].clone();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    // Globex: 1 awarded of 1 decided; Acme: 1 awarded of 2.
    assert_eq!(rows[0]["vendor_id"], s.globex_id);
    assert_eq!(rows[0]["success_rate"], 100.0);
    assert_eq!(rows[1]["success_rate"], 50.0);
}

// ---------------------------------------------------------------------------
// Test: single-vendor view
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_vendor_analytics_access() {
    let s = seeded().await;

    let own = format!("/api/v1/analytics/vendor/{}", s.acme_id);
    let response = get_auth(s.app.router(), &own, &s.acme).await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["performance"]["total_submitted"], 2);
    assert_eq!(data["performance"]["total_awarded"], 1);
    assert_eq!(data["performance"]["success_rate"], 50.0);
    assert_eq!(data["performance"]["total_earnings"], 1000.0);

    let response = get_auth(s.app.router(), &own, &s.admin).await;
    assert_eq!(response.status(), StatusCode::OK);

    let other = format!("/api/v1/analytics/vendor/{}", s.globex_id);
    let response = get_auth(s.app.router(), &other, &s.acme).await;
    assert_error(response, StatusCode::FORBIDDEN, "FORBIDDEN").await;
}
