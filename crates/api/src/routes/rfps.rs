//! Route definitions for `/rfps`.

use axum::routing::get;
use axum::Router;

use crate::handlers::rfps;
use crate::state::AppState;

/// RFP routes mounted at `/rfps`.
///
/// ```text
/// GET    /                     -> list_rfps
/// POST   /                     -> create_rfp
/// GET    /vendor/{vendor_id}   -> list_vendor_rfps
/// GET    /analytics/summary    -> rfp_summary
/// GET    /{id}                 -> get_rfp
/// PATCH  /{id}                 -> update_rfp
/// PUT    /{id}                 -> update_rfp
/// DELETE /{id}                 -> delete_rfp
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(rfps::list_rfps).post(rfps::create_rfp))
        .route("/vendor/{vendor_id}", get(rfps::list_vendor_rfps))
        .route("/analytics/summary", get(rfps::rfp_summary))
        .route(
            "/{id}",
            get(rfps::get_rfp)
                .patch(rfps::update_rfp)
                .put(rfps::update_rfp)
                .delete(rfps::delete_rfp),
        )
}
