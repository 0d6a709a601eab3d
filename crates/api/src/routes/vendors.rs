//! Route definitions for `/vendors`.

use axum::routing::get;
use axum::Router;

use crate::handlers::vendors;
use crate::state::AppState;

/// Vendor routes mounted at `/vendors`.
///
/// ```text
/// GET    /{id}/integrations    -> get_integrations
/// PUT    /{id}/integrations    -> put_integrations
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{id}/integrations",
        get(vendors::get_integrations).put(vendors::put_integrations),
    )
}
