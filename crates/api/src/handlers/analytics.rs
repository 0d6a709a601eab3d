//! Handlers for the `/analytics` dashboards.
//!
//! All reports except the single-vendor view are admin only and take the
//! [`RequireAdmin`] extractor.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use procura_core::analytics::{
    self, MonthlySpending, Overview, StatusBreakdown, TopVendors, TopVendorsParams,
    VendorAnalytics, VendorPerformance,
};
use procura_core::types::DbId;
use serde::Deserialize;

use crate::error::AppResult;
use crate::extract::AppQuery;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /analytics/spending/monthly`.
#[derive(Debug, Default, Deserialize)]
pub struct MonthlySpendingParams {
    /// Defaults to the current UTC year.
    pub year: Option<i32>,
}

/// GET /api/v1/analytics/admin/overview
pub async fn overview(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Overview>>> {
    let report =
        analytics::overview(state.rfps.as_ref(), state.users.as_ref(), &auth.actor()).await?;
    Ok(Json(DataResponse { data: report }))
}

/// GET /api/v1/analytics/spending/monthly?year=
pub async fn monthly_spending(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<MonthlySpendingParams>,
) -> AppResult<Json<DataResponse<MonthlySpending>>> {
    let report =
        analytics::monthly_spending(state.rfps.as_ref(), &auth.actor(), params.year, Utc::now())
            .await?;
    Ok(Json(DataResponse { data: report }))
}

/// GET /api/v1/analytics/rfp-status
pub async fn status_breakdown(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<StatusBreakdown>>> {
    let report = analytics::status_breakdown(state.rfps.as_ref(), &auth.actor()).await?;
    Ok(Json(DataResponse { data: report }))
}

/// GET /api/v1/analytics/top-vendors?limit=&metric=
///
/// `metric` is `value` (default) or `count`; `limit` is 1-50 (default 5).
pub async fn top_vendors(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<TopVendorsParams>,
) -> AppResult<Json<DataResponse<TopVendors>>> {
    let report = analytics::top_vendors(
        state.rfps.as_ref(),
        state.users.as_ref(),
        &auth.actor(),
        params,
    )
    .await?;
    Ok(Json(DataResponse { data: report }))
}

/// GET /api/v1/analytics/vendor-performance
pub async fn vendor_performance(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<VendorPerformance>>>> {
    let report =
        analytics::vendor_performance(state.rfps.as_ref(), state.users.as_ref(), &auth.actor())
            .await?;
    Ok(Json(DataResponse { data: report }))
}

/// GET /api/v1/analytics/vendor/{id}
///
/// Open to admins and to the vendor itself.
pub async fn vendor_analytics(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(vendor_id): Path<DbId>,
) -> AppResult<Json<DataResponse<VendorAnalytics>>> {
    let report =
        analytics::vendor_analytics(state.rfps.as_ref(), &auth.actor(), vendor_id).await?;
    Ok(Json(DataResponse { data: report }))
}
