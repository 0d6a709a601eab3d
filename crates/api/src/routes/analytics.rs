//! Route definitions for `/analytics`.

use axum::routing::get;
use axum::Router;

use crate::handlers::analytics;
use crate::state::AppState;

/// Analytics routes mounted at `/analytics`.
///
/// ```text
/// GET    /admin/overview       -> overview
/// GET    /spending/monthly     -> monthly_spending
/// GET    /rfp-status           -> status_breakdown
/// GET    /top-vendors          -> top_vendors
/// GET    /vendor-performance   -> vendor_performance
/// GET    /vendor/{id}          -> vendor_analytics
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/overview", get(analytics::overview))
        .route("/spending/monthly", get(analytics::monthly_spending))
        .route("/rfp-status", get(analytics::status_breakdown))
        .route("/top-vendors", get(analytics::top_vendors))
        .route("/vendor-performance", get(analytics::vendor_performance))
        .route("/vendor/{id}", get(analytics::vendor_analytics))
}
