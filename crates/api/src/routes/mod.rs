pub mod analytics;
pub mod auth;
pub mod health;
pub mod rfps;
pub mod vendors;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                       register (public)
/// /auth/login                          login (public)
/// /auth/me                             current user (requires auth)
///
/// /rfps                                list, create
/// /rfps/vendor/{vendor_id}             list one vendor's RFPs
/// /rfps/analytics/summary              caller-scoped summary
/// /rfps/{id}                           get, update (PATCH/PUT), delete
///
/// /analytics/admin/overview            dashboard overview (admin)
/// /analytics/spending/monthly          monthly awarded spend (admin)
/// /analytics/rfp-status                status breakdown (admin)
/// /analytics/top-vendors               top vendors (admin)
/// /analytics/vendor-performance        per-vendor success rates (admin)
/// /analytics/vendor/{id}               single vendor (admin or that vendor)
///
/// /vendors/{id}/integrations           get, put integration settings
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/rfps", rfps::router())
        .nest("/analytics", analytics::router())
        .nest("/vendors", vendors::router())
}
