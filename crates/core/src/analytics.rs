//! Procurement analytics derived from the RFP collection.
//!
//! The store supplies grouped counts and sums; this module fills in missing
//! statuses and months, attaches vendor names, and applies the numeric
//! rules: currency rounded to 2 decimals, percentages to 1 decimal, empty
//! sums reported as 0.

use std::collections::HashMap;

use chrono::{Datelike, Months};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::policy;
use crate::query::{PageRequest, RfpFilter, RfpSort};
use crate::rfp::{Rfp, RfpStatus};
use crate::roles::{Actor, Role};
use crate::store::{MonthBucket, MonthTotal, RfpStore, StatusTotal, UserStore, VendorTotal};
use crate::types::{DbId, Timestamp};
use crate::user::User;

/// Number of recent RFPs attached to overview and vendor reports.
pub const RECENT_RFP_LIMIT: i64 = 5;

/// Default and maximum size of the top-vendors leaderboard.
pub const DEFAULT_TOP_VENDORS: i64 = 5;
pub const MAX_TOP_VENDORS: i64 = 50;

/// Awarded RFPs listed under each top vendor.
pub const TOP_VENDOR_RECENT_RFPS: i64 = 3;

/// Size of the vendor leaderboard in the RFP summary.
pub const SUMMARY_TOP_VENDORS: usize = 10;

/// Months of history in the RFP summary trend.
pub const TREND_MONTHS: u32 = 6;

/// Name reported for vendors whose account no longer exists.
pub const UNKNOWN_VENDOR: &str = "Unknown Vendor";

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

// ---------------------------------------------------------------------------
// Numeric helpers
// ---------------------------------------------------------------------------

/// Round a currency figure to 2 decimal places.
///
/// Values too large to scale are returned unchanged.
pub fn round_currency(value: f64) -> f64 {
    let scaled = value * 100.0;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / 100.0
}

/// Round a percentage to 1 decimal place.
pub fn round_percent(value: f64) -> f64 {
    let scaled = value * 10.0;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / 10.0
}

/// `part / whole * 100` rounded to 1 decimal, or 0 when `whole` is 0.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        round_percent(part / whole * 100.0)
    }
}

/// Awarded share of submitted-or-awarded RFPs, as a percentage.
pub fn success_rate(submitted: i64, awarded: i64) -> f64 {
    percentage(awarded as f64, (submitted + awarded) as f64)
}

// ---------------------------------------------------------------------------
// Shared report pieces
// ---------------------------------------------------------------------------

/// Count per status. All four statuses are always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    #[serde(rename = "Draft")]
    pub draft: i64,
    #[serde(rename = "Submitted")]
    pub submitted: i64,
    #[serde(rename = "Awarded")]
    pub awarded: i64,
    #[serde(rename = "Rejected")]
    pub rejected: i64,
}

impl StatusCounts {
    pub fn from_totals(totals: &[StatusTotal]) -> Self {
        let mut counts = Self::default();
        for total in totals {
            *counts.slot(total.status) += total.count;
        }
        counts
    }

    pub fn get(&self, status: RfpStatus) -> i64 {
        match status {
            RfpStatus::Draft => self.draft,
            RfpStatus::Submitted => self.submitted,
            RfpStatus::Awarded => self.awarded,
            RfpStatus::Rejected => self.rejected,
        }
    }

    pub fn total(&self) -> i64 {
        self.draft + self.submitted + self.awarded + self.rejected
    }

    fn slot(&mut self, status: RfpStatus) -> &mut i64 {
        match status {
            RfpStatus::Draft => &mut self.draft,
            RfpStatus::Submitted => &mut self.submitted,
            RfpStatus::Awarded => &mut self.awarded,
            RfpStatus::Rejected => &mut self.rejected,
        }
    }
}

/// Vendor identity attached to report rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorRef {
    pub id: DbId,
    pub name: String,
    pub email: String,
}

impl From<&User> for VendorRef {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Compact RFP row used in "recent" lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentRfp {
    pub id: DbId,
    pub title: String,
    pub amount: f64,
    pub status: RfpStatus,
    pub submission_deadline: Timestamp,
    pub created_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<VendorRef>,
}

impl RecentRfp {
    fn new(rfp: Rfp, vendor: Option<VendorRef>) -> Self {
        Self {
            id: rfp.id,
            title: rfp.title,
            amount: round_currency(rfp.amount),
            status: rfp.status,
            submission_deadline: rfp.submission_deadline,
            created_at: rfp.created_at,
            vendor,
        }
    }
}

// ---------------------------------------------------------------------------
// Overview
// ---------------------------------------------------------------------------

/// Admin dashboard headline figures.
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub total_procurement_value: f64,
    pub rfp_status_summary: StatusCounts,
    pub vendor_count: i64,
    pub recent_rfps: Vec<RecentRfp>,
}

/// Awarded value, status counts, vendor count and the latest RFPs. Admin only.
pub async fn overview(
    rfps: &dyn RfpStore,
    users: &dyn UserStore,
    actor: &Actor,
) -> CoreResult<Overview> {
    policy::ensure_admin(actor)?;

    let totals = rfps.status_totals(None).await?;
    let awarded_value: f64 = totals
        .iter()
        .filter(|t| t.status == RfpStatus::Awarded)
        .map(|t| t.total_value)
        .sum();

    let vendor_count = users.count_by_role(Role::Vendor).await?;
    let recent = recent_rfps(rfps, RfpFilter::default()).await?;
    let recent_rfps = attach_vendors(users, recent).await?;

    Ok(Overview {
        total_procurement_value: round_currency(awarded_value),
        rfp_status_summary: StatusCounts::from_totals(&totals),
        vendor_count,
        recent_rfps,
    })
}

async fn recent_rfps(rfps: &dyn RfpStore, filter: RfpFilter) -> CoreResult<Vec<Rfp>> {
    let page = PageRequest {
        page: 1,
        limit: RECENT_RFP_LIMIT,
    };
    let (items, _) = rfps.list(&filter, RfpSort::newest_first(), page).await?;
    Ok(items)
}

async fn attach_vendors(users: &dyn UserStore, items: Vec<Rfp>) -> CoreResult<Vec<RecentRfp>> {
    let directory = load_users(users, items.iter().map(|r| r.vendor_id)).await?;
    Ok(items
        .into_iter()
        .map(|rfp| {
            let vendor = directory.get(&rfp.vendor_id).map(VendorRef::from);
            RecentRfp::new(rfp, vendor)
        })
        .collect())
}

/// Fetch the given users keyed by id, skipping ids with no account.
pub async fn load_users(
    users: &dyn UserStore,
    ids: impl Iterator<Item = DbId>,
) -> CoreResult<HashMap<DbId, User>> {
    let mut ids: Vec<DbId> = ids.collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(users
        .find_many(&ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect())
}

// ---------------------------------------------------------------------------
// Monthly spending
// ---------------------------------------------------------------------------

/// Awarded spend in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySpendingEntry {
    pub month: &'static str,
    pub short_month: &'static str,
    pub value: f64,
    pub count: i64,
}

/// Twelve months of awarded spend for one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySpending {
    pub year: i32,
    pub monthly_spending: Vec<MonthlySpendingEntry>,
    pub total_spend: f64,
    pub total_count: i64,
}

/// Zero-fill the store's month totals into a 12-entry report.
pub fn build_monthly_spending(year: i32, totals: &[MonthTotal]) -> MonthlySpending {
    let monthly_spending: Vec<MonthlySpendingEntry> = MONTH_NAMES
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            let month = idx as u32 + 1;
            let (total, count) = totals
                .iter()
                .filter(|t| t.month == month)
                .fold((0.0, 0), |(v, c), t| (v + t.total, c + t.count));
            MonthlySpendingEntry {
                month: name,
                short_month: &name[..3],
                value: round_currency(total),
                count,
            }
        })
        .collect();

    let total_spend = round_currency(monthly_spending.iter().map(|m| m.value).sum());
    let total_count = monthly_spending.iter().map(|m| m.count).sum();

    MonthlySpending {
        year,
        monthly_spending,
        total_spend,
        total_count,
    }
}

/// Awarded spend per month of `year` (defaults to the current year). Admin only.
pub async fn monthly_spending(
    rfps: &dyn RfpStore,
    actor: &Actor,
    year: Option<i32>,
    now: Timestamp,
) -> CoreResult<MonthlySpending> {
    policy::ensure_admin(actor)?;
    let year = year.unwrap_or_else(|| now.year());
    if !(1970..=9999).contains(&year) {
        return Err(CoreError::Validation(
            "year must be between 1970 and 9999".into(),
        ));
    }
    let totals = rfps.awarded_by_month(year).await?;
    Ok(build_monthly_spending(year, &totals))
}

// ---------------------------------------------------------------------------
// Status breakdown
// ---------------------------------------------------------------------------

/// One status slice with its share of count and value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusBreakdownEntry {
    pub status: RfpStatus,
    pub count: i64,
    pub value: f64,
    pub percentage_by_count: f64,
    pub percentage_by_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TotalStats {
    pub total_count: i64,
    pub total_value: f64,
}

/// Count and value per status with percentages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusBreakdown {
    pub summary: StatusCounts,
    pub details: Vec<StatusBreakdownEntry>,
    pub total_stats: TotalStats,
}

/// Compute the breakdown from raw status totals.
///
/// `details` lists only statuses present in the data, highest value first.
pub fn build_status_breakdown(totals: &[StatusTotal]) -> StatusBreakdown {
    let total_count: i64 = totals.iter().map(|t| t.count).sum();
    let total_value: f64 = totals.iter().map(|t| t.total_value).sum();

    let mut present: Vec<&StatusTotal> = totals.iter().filter(|t| t.count > 0).collect();
    present.sort_by(|a, b| {
        b.total_value
            .total_cmp(&a.total_value)
            .then_with(|| a.status.cmp(&b.status))
    });

    let details = present
        .into_iter()
        .map(|t| StatusBreakdownEntry {
            status: t.status,
            count: t.count,
            value: round_currency(t.total_value),
            percentage_by_count: percentage(t.count as f64, total_count as f64),
            percentage_by_value: percentage(t.total_value, total_value),
        })
        .collect();

    StatusBreakdown {
        summary: StatusCounts::from_totals(totals),
        details,
        total_stats: TotalStats {
            total_count,
            total_value: round_currency(total_value),
        },
    }
}

/// Status breakdown across all RFPs. Admin only.
pub async fn status_breakdown(rfps: &dyn RfpStore, actor: &Actor) -> CoreResult<StatusBreakdown> {
    policy::ensure_admin(actor)?;
    let totals = rfps.status_totals(None).await?;
    Ok(build_status_breakdown(&totals))
}

// ---------------------------------------------------------------------------
// Vendor analytics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VendorPerformanceSummary {
    /// Submitted plus awarded RFPs.
    pub total_submitted: i64,
    pub total_awarded: i64,
    pub success_rate: f64,
    pub total_earnings: f64,
}

/// Single-vendor dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct VendorAnalytics {
    pub vendor_id: DbId,
    pub rfp_counts: StatusCounts,
    pub performance: VendorPerformanceSummary,
    pub recent_rfps: Vec<RecentRfp>,
}

pub fn build_vendor_performance_summary(totals: &[StatusTotal]) -> VendorPerformanceSummary {
    let counts = StatusCounts::from_totals(totals);
    let earnings: f64 = totals
        .iter()
        .filter(|t| t.status == RfpStatus::Awarded)
        .map(|t| t.total_value)
        .sum();
    VendorPerformanceSummary {
        total_submitted: counts.submitted + counts.awarded,
        total_awarded: counts.awarded,
        success_rate: success_rate(counts.submitted, counts.awarded),
        total_earnings: round_currency(earnings),
    }
}

/// Analytics for one vendor. Admins, or the vendor itself.
pub async fn vendor_analytics(
    rfps: &dyn RfpStore,
    actor: &Actor,
    vendor_id: DbId,
) -> CoreResult<VendorAnalytics> {
    policy::ensure_vendor_view(actor, vendor_id)?;

    let totals = rfps.status_totals(Some(vendor_id)).await?;
    let recent = recent_rfps(rfps, RfpFilter::for_vendor(vendor_id)).await?;

    Ok(VendorAnalytics {
        vendor_id,
        rfp_counts: StatusCounts::from_totals(&totals),
        performance: build_vendor_performance_summary(&totals),
        recent_rfps: recent.into_iter().map(|r| RecentRfp::new(r, None)).collect(),
    })
}

// ---------------------------------------------------------------------------
// Vendor performance and leaderboards
// ---------------------------------------------------------------------------

/// Per-vendor performance row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorPerformance {
    pub vendor_id: DbId,
    pub name: String,
    pub email: Option<String>,
    pub total_rfps: i64,
    pub total_value: f64,
    pub submitted: i64,
    pub awarded: i64,
    pub rejected: i64,
    pub success_rate: f64,
}

impl VendorPerformance {
    fn new(total: &VendorTotal, user: Option<&User>) -> Self {
        Self {
            vendor_id: total.vendor_id,
            name: user.map_or_else(|| UNKNOWN_VENDOR.to_string(), |u| u.name.clone()),
            email: user.map(|u| u.email.clone()),
            total_rfps: total.total_rfps,
            total_value: round_currency(total.total_value),
            submitted: total.submitted,
            awarded: total.awarded,
            rejected: total.rejected,
            success_rate: success_rate(total.submitted, total.awarded),
        }
    }
}

/// Every vendor with at least one RFP, best success rate first.
pub async fn vendor_performance(
    rfps: &dyn RfpStore,
    users: &dyn UserStore,
    actor: &Actor,
) -> CoreResult<Vec<VendorPerformance>> {
    policy::ensure_admin(actor)?;
    let totals = rfps.vendor_totals().await?;
    let directory = load_users(users, totals.iter().map(|t| t.vendor_id)).await?;

    let mut rows: Vec<VendorPerformance> = totals
        .iter()
        .map(|t| VendorPerformance::new(t, directory.get(&t.vendor_id)))
        .collect();
    rows.sort_by(|a, b| {
        b.success_rate
            .total_cmp(&a.success_rate)
            .then_with(|| b.total_value.total_cmp(&a.total_value))
            .then_with(|| a.vendor_id.cmp(&b.vendor_id))
    });
    Ok(rows)
}

/// Ranking metric for the top-vendors leaderboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopVendorMetric {
    #[default]
    Value,
    Count,
}

/// Query parameters for the top-vendors leaderboard.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopVendorsParams {
    pub limit: Option<i64>,
    pub metric: Option<String>,
}

/// One awarded RFP listed under a top vendor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopVendorRfp {
    pub id: DbId,
    pub title: String,
    pub amount: f64,
}

impl From<Rfp> for TopVendorRfp {
    fn from(rfp: Rfp) -> Self {
        Self {
            id: rfp.id,
            title: rfp.title,
            amount: round_currency(rfp.amount),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopVendor {
    pub id: DbId,
    pub name: String,
    pub email: Option<String>,
    pub total_value: f64,
    pub count: i64,
    /// Latest awarded RFPs, newest first.
    pub recent_rfps: Vec<TopVendorRfp>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopVendors {
    pub metric: TopVendorMetric,
    pub top_vendors: Vec<TopVendor>,
}

/// Rank vendors by awarded value or awarded count.
pub fn rank_top_vendors(
    totals: &[VendorTotal],
    directory: &HashMap<DbId, User>,
    metric: TopVendorMetric,
    limit: usize,
) -> Vec<TopVendor> {
    let mut awarded: Vec<&VendorTotal> = totals.iter().filter(|t| t.awarded > 0).collect();
    awarded.sort_by(|a, b| {
        let primary = match metric {
            TopVendorMetric::Value => b.awarded_value.total_cmp(&a.awarded_value),
            TopVendorMetric::Count => b.awarded.cmp(&a.awarded),
        };
        primary.then_with(|| a.vendor_id.cmp(&b.vendor_id))
    });

    awarded
        .into_iter()
        .take(limit)
        .map(|t| {
            let user = directory.get(&t.vendor_id);
            TopVendor {
                id: t.vendor_id,
                name: user.map_or_else(|| UNKNOWN_VENDOR.to_string(), |u| u.name.clone()),
                email: user.map(|u| u.email.clone()),
                total_value: round_currency(t.awarded_value),
                count: t.awarded,
                recent_rfps: Vec::new(),
            }
        })
        .collect()
}

/// Top vendors by awarded RFPs. Admin only.
///
/// Any metric other than `count` ranks by value.
pub async fn top_vendors(
    rfps: &dyn RfpStore,
    users: &dyn UserStore,
    actor: &Actor,
    params: TopVendorsParams,
) -> CoreResult<TopVendors> {
    policy::ensure_admin(actor)?;

    let limit = params.limit.unwrap_or(DEFAULT_TOP_VENDORS);
    if !(1..=MAX_TOP_VENDORS).contains(&limit) {
        return Err(CoreError::Validation(format!(
            "limit must be between 1 and {MAX_TOP_VENDORS}"
        )));
    }
    let metric = match params.metric.as_deref() {
        Some("count") => TopVendorMetric::Count,
        _ => TopVendorMetric::Value,
    };

    let totals = rfps.vendor_totals().await?;
    let directory = load_users(
        users,
        totals.iter().filter(|t| t.awarded > 0).map(|t| t.vendor_id),
    )
    .await?;

    let mut top_vendors = rank_top_vendors(&totals, &directory, metric, limit as usize);
    let page = PageRequest {
        page: 1,
        limit: TOP_VENDOR_RECENT_RFPS,
    };
    for vendor in &mut top_vendors {
        let filter = RfpFilter {
            status: Some(RfpStatus::Awarded),
            ..RfpFilter::for_vendor(vendor.id)
        };
        let (items, _) = rfps.list(&filter, RfpSort::newest_first(), page).await?;
        vendor.recent_rfps = items.into_iter().map(TopVendorRfp::from).collect();
    }

    Ok(TopVendors {
        metric,
        top_vendors,
    })
}

// ---------------------------------------------------------------------------
// RFP summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusAmount {
    pub status: RfpStatus,
    pub count: i64,
    pub total_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrendEntry {
    pub year: i32,
    pub month: u32,
    pub count: i64,
    pub total_amount: f64,
}

impl From<&MonthBucket> for MonthlyTrendEntry {
    fn from(bucket: &MonthBucket) -> Self {
        Self {
            year: bucket.year,
            month: bucket.month,
            count: bucket.count,
            total_amount: round_currency(bucket.total_amount),
        }
    }
}

/// Caller-scoped RFP summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RfpSummary {
    pub total: i64,
    pub avg_amount: f64,
    pub by_status: Vec<StatusAmount>,
    pub monthly_trend: Vec<MonthlyTrendEntry>,
    /// Present for admins only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_vendors: Option<Vec<VendorPerformance>>,
}

/// Start of the summary trend window.
pub fn trend_start(now: Timestamp) -> Timestamp {
    now.checked_sub_months(Months::new(TREND_MONTHS))
        .unwrap_or(now)
}

/// Summary of the caller's RFPs (all RFPs for admins).
pub async fn rfp_summary(
    rfps: &dyn RfpStore,
    users: &dyn UserStore,
    actor: &Actor,
    now: Timestamp,
) -> CoreResult<RfpSummary> {
    let scope = policy::scope_vendor_filter(actor, None);

    let totals = rfps.status_totals(scope).await?;
    let total: i64 = totals.iter().map(|t| t.count).sum();
    let total_amount: f64 = totals.iter().map(|t| t.total_value).sum();
    let avg_amount = if total == 0 {
        0.0
    } else {
        round_currency(total_amount / total as f64)
    };

    let by_status = totals
        .iter()
        .filter(|t| t.count > 0)
        .map(|t| StatusAmount {
            status: t.status,
            count: t.count,
            total_amount: round_currency(t.total_value),
        })
        .collect();

    let monthly_trend = rfps
        .created_by_month(trend_start(now), scope)
        .await?
        .iter()
        .map(MonthlyTrendEntry::from)
        .collect();

    let top_vendors = if policy::can_list_all(actor) {
        let vendor_totals = rfps.vendor_totals().await?;
        let directory = load_users(users, vendor_totals.iter().map(|t| t.vendor_id)).await?;
        let mut rows: Vec<VendorPerformance> = vendor_totals
            .iter()
            .map(|t| VendorPerformance::new(t, directory.get(&t.vendor_id)))
            .collect();
        rows.sort_by(|a, b| {
            b.total_value
                .total_cmp(&a.total_value)
                .then_with(|| a.vendor_id.cmp(&b.vendor_id))
        });
        rows.truncate(SUMMARY_TOP_VENDORS);
        Some(rows)
    } else {
        None
    };

    Ok(RfpSummary {
        total,
        avg_amount,
        by_status,
        monthly_trend,
        top_vendors,
    })
}
