//! Handlers for per-vendor integration settings.
//!
//! Settings are stored but never acted on by this service. The Twilio auth
//! token is redacted in every response.

use axum::extract::{Path, State};
use axum::Json;
use procura_core::types::DbId;
use procura_core::vendor_settings::{self, SaveVendorSettings, VendorIntegrationSettings};

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/vendors/{id}/integrations
pub async fn get_integrations(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(vendor_id): Path<DbId>,
) -> AppResult<Json<DataResponse<VendorIntegrationSettings>>> {
    let settings =
        vendor_settings::get(state.vendor_settings.as_ref(), &auth.actor(), vendor_id).await?;
    Ok(Json(DataResponse { data: settings }))
}

/// PUT /api/v1/vendors/{id}/integrations
///
/// Omitted sections keep their stored value.
pub async fn put_integrations(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(vendor_id): Path<DbId>,
    AppJson(input): AppJson<SaveVendorSettings>,
) -> AppResult<Json<DataResponse<VendorIntegrationSettings>>> {
    let settings = vendor_settings::save(
        state.vendor_settings.as_ref(),
        state.users.as_ref(),
        &auth.actor(),
        vendor_id,
        input,
    )
    .await?;

    tracing::info!(vendor_id, user_id = auth.user_id, "Vendor integrations saved");

    Ok(Json(DataResponse { data: settings }))
}
