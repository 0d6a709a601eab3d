//! Handlers for the `/rfps` resource.
//!
//! Every RFP returned over HTTP carries a derived `days_remaining` field
//! computed at response time. List and get responses also name the owning
//! vendor. Ownership and role checks live in `procura_core`; handlers only
//! translate the authenticated user into an
//! [`Actor`](procura_core::roles::Actor).

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use procura_core::analytics::{self, RfpSummary, VendorRef};
use procura_core::lifecycle::{self, NewRfp, RfpPatch};
use procura_core::query::{self, Pagination, RfpCriteria, RfpListParams, RfpPage};
use procura_core::rfp::Rfp;
use procura_core::types::{DbId, Timestamp};
use procura_core::user::User;
use serde::Serialize;

use crate::error::AppResult;
use crate::extract::{AppJson, AppQuery};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// An RFP with its derived countdown.
#[derive(Debug, Serialize)]
pub struct RfpView {
    #[serde(flatten)]
    pub rfp: Rfp,
    pub days_remaining: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<VendorRef>,
}

impl RfpView {
    fn new(rfp: Rfp, now: Timestamp) -> Self {
        let days_remaining = rfp.days_remaining(now);
        Self {
            rfp,
            days_remaining,
            vendor: None,
        }
    }

    fn with_vendor(rfp: Rfp, now: Timestamp, directory: &HashMap<DbId, User>) -> Self {
        let vendor = directory.get(&rfp.vendor_id).map(VendorRef::from);
        Self {
            vendor,
            ..Self::new(rfp, now)
        }
    }
}

/// A page of RFPs as returned by the list endpoints.
#[derive(Debug, Serialize)]
pub struct RfpPageView {
    pub items: Vec<RfpView>,
    pub pagination: Pagination,
}

impl RfpPageView {
    async fn load(state: &AppState, page: RfpPage, now: Timestamp) -> AppResult<Self> {
        let directory =
            analytics::load_users(state.users.as_ref(), page.items.iter().map(|r| r.vendor_id))
                .await?;
        Ok(Self {
            items: page
                .items
                .into_iter()
                .map(|rfp| RfpView::with_vendor(rfp, now, &directory))
                .collect(),
            pagination: page.pagination,
        })
    }
}

/// POST /api/v1/rfps
///
/// Create an RFP owned by the caller. Any `vendor_id` in the body is ignored.
pub async fn create_rfp(
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(input): AppJson<NewRfp>,
) -> AppResult<(StatusCode, Json<DataResponse<RfpView>>)> {
    let now = Utc::now();
    let rfp = lifecycle::create(state.rfps.as_ref(), &auth.actor(), input, now).await?;

    tracing::info!(rfp_id = rfp.id, user_id = auth.user_id, "RFP created");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: RfpView::new(rfp, now),
        }),
    ))
}

/// GET /api/v1/rfps
///
/// List RFPs visible to the caller. Vendors only ever see their own.
pub async fn list_rfps(
    auth: AuthUser,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<RfpListParams>,
) -> AppResult<Json<DataResponse<RfpPageView>>> {
    let criteria = RfpCriteria::from_params(params)?;
    let page = query::list(state.rfps.as_ref(), &auth.actor(), criteria).await?;

    Ok(Json(DataResponse {
        data: RfpPageView::load(&state, page, Utc::now()).await?,
    }))
}

/// GET /api/v1/rfps/vendor/{vendor_id}
///
/// List one vendor's RFPs. Admins, or the vendor itself.
pub async fn list_vendor_rfps(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(vendor_id): Path<DbId>,
    AppQuery(params): AppQuery<RfpListParams>,
) -> AppResult<Json<DataResponse<RfpPageView>>> {
    let criteria = RfpCriteria::from_params(params)?;
    let page =
        query::list_for_vendor(state.rfps.as_ref(), &auth.actor(), vendor_id, criteria).await?;

    Ok(Json(DataResponse {
        data: RfpPageView::load(&state, page, Utc::now()).await?,
    }))
}

/// GET /api/v1/rfps/{id}
pub async fn get_rfp(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(rfp_id): Path<DbId>,
) -> AppResult<Json<DataResponse<RfpView>>> {
    let rfp = lifecycle::get(state.rfps.as_ref(), &auth.actor(), rfp_id).await?;
    let directory =
        analytics::load_users(state.users.as_ref(), std::iter::once(rfp.vendor_id)).await?;

    Ok(Json(DataResponse {
        data: RfpView::with_vendor(rfp, Utc::now(), &directory),
    }))
}

/// PATCH|PUT /api/v1/rfps/{id}
///
/// Partial update. A changed `status` is recorded in the history; a
/// `comment` is appended to the comment log.
pub async fn update_rfp(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(rfp_id): Path<DbId>,
    AppJson(patch): AppJson<RfpPatch>,
) -> AppResult<Json<DataResponse<RfpView>>> {
    let now = Utc::now();
    let rfp = lifecycle::update(state.rfps.as_ref(), &auth.actor(), rfp_id, patch, now).await?;

    tracing::info!(
        rfp_id,
        user_id = auth.user_id,
        status = rfp.status.as_str(),
        "RFP updated"
    );

    Ok(Json(DataResponse {
        data: RfpView::new(rfp, now),
    }))
}

/// DELETE /api/v1/rfps/{id}
pub async fn delete_rfp(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(rfp_id): Path<DbId>,
) -> AppResult<StatusCode> {
    lifecycle::delete(state.rfps.as_ref(), &auth.actor(), rfp_id).await?;

    tracing::info!(rfp_id, user_id = auth.user_id, "RFP deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/rfps/analytics/summary
///
/// Totals, status split and six-month trend over the caller's RFPs (all
/// RFPs for admins, who also get the top vendors).
pub async fn rfp_summary(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<RfpSummary>>> {
    let summary = analytics::rfp_summary(
        state.rfps.as_ref(),
        state.users.as_ref(),
        &auth.actor(),
        Utc::now(),
    )
    .await?;

    Ok(Json(DataResponse { data: summary }))
}
