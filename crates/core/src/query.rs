//! RFP filtering, sorting and pagination.
//!
//! Caller-supplied list parameters are validated into [`RfpCriteria`]. The
//! filter is AND-composed; an empty result set is a normal outcome.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::policy;
use crate::rfp::{parse_date, Rfp, RfpStatus};
use crate::roles::Actor;
use crate::store::RfpStore;
use crate::types::{DbId, Timestamp};

/// Default page (1-indexed).
pub const DEFAULT_PAGE: i64 = 1;

/// Default page size.
pub const DEFAULT_LIMIT: i64 = 10;

/// Largest accepted page size; larger requests are clamped.
pub const MAX_LIMIT: i64 = 100;

// ---------------------------------------------------------------------------
// Raw parameters
// ---------------------------------------------------------------------------

/// List parameters as they arrive in a query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RfpListParams {
    pub vendor: Option<DbId>,
    pub status: Option<String>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Validated filter. Every present criterion must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RfpFilter {
    pub vendor_id: Option<DbId>,
    pub status: Option<RfpStatus>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub deadline_from: Option<Timestamp>,
    pub deadline_to: Option<Timestamp>,
    /// Case-insensitive substring matched against title or description.
    pub search: Option<String>,
}

impl RfpFilter {
    pub fn for_vendor(vendor_id: DbId) -> Self {
        Self {
            vendor_id: Some(vendor_id),
            ..Default::default()
        }
    }

    /// Evaluate the filter against one record (used by the in-memory store).
    pub fn matches(&self, rfp: &Rfp) -> bool {
        if self.vendor_id.is_some_and(|v| v != rfp.vendor_id) {
            return false;
        }
        if self.status.is_some_and(|s| s != rfp.status) {
            return false;
        }
        if self.min_amount.is_some_and(|min| rfp.amount < min) {
            return false;
        }
        if self.max_amount.is_some_and(|max| rfp.amount > max) {
            return false;
        }
        if self
            .deadline_from
            .is_some_and(|from| rfp.submission_deadline < from)
        {
            return false;
        }
        if self
            .deadline_to
            .is_some_and(|to| rfp.submission_deadline > to)
        {
            return false;
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !rfp.title.to_lowercase().contains(&needle)
                && !rfp.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

/// Sortable RFP fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Title,
    Amount,
    SubmissionDeadline,
    Status,
}

impl SortField {
    pub fn parse(value: &str) -> CoreResult<Self> {
        match value {
            "created_at" | "createdAt" => Ok(SortField::CreatedAt),
            "updated_at" | "updatedAt" => Ok(SortField::UpdatedAt),
            "title" => Ok(SortField::Title),
            "amount" => Ok(SortField::Amount),
            "submission_deadline" | "submissionDeadline" => Ok(SortField::SubmissionDeadline),
            "status" => Ok(SortField::Status),
            other => Err(CoreError::Validation(format!(
                "Invalid sort_by '{other}'. Must be one of: created_at, updated_at, title, \
                 amount, submission_deadline, status"
            ))),
        }
    }

    /// Column name in the `rfps` table.
    pub fn column(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::Title => "title",
            SortField::Amount => "amount",
            SortField::SubmissionDeadline => "submission_deadline",
            SortField::Status => "status",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(value: &str) -> CoreResult<Self> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(CoreError::Validation(format!(
                "Invalid sort_order '{other}'. Must be 'asc' or 'desc'"
            ))),
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Single-field sort. Ties are broken by id in the same direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RfpSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for RfpSort {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            direction: SortDirection::Desc,
        }
    }
}

impl RfpSort {
    /// Newest first by creation time.
    pub fn newest_first() -> Self {
        Self::default()
    }

    /// Compare two records under this sort (used by the in-memory store).
    pub fn compare(&self, a: &Rfp, b: &Rfp) -> Ordering {
        let ordering = match self.field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::Title => a.title.cmp(&b.title),
            SortField::Amount => a.amount.total_cmp(&b.amount),
            SortField::SubmissionDeadline => a.submission_deadline.cmp(&b.submission_deadline),
            SortField::Status => a.status.as_str().cmp(b.status.as_str()),
        }
        .then_with(|| a.id.cmp(&b.id));

        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Validate `page >= 1` and `limit >= 1`, clamping `limit` to [`MAX_LIMIT`].
    pub fn new(page: Option<i64>, limit: Option<i64>) -> CoreResult<Self> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        if page < 1 {
            return Err(CoreError::Validation("page must be >= 1".into()));
        }
        if limit < 1 {
            return Err(CoreError::Validation("limit must be >= 1".into()));
        }
        Ok(Self {
            page,
            limit: limit.min(MAX_LIMIT),
        })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Pagination metadata returned with each page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(total: i64, request: PageRequest) -> Self {
        Self {
            total,
            page: request.page,
            limit: request.limit,
            pages: (total + request.limit - 1) / request.limit,
        }
    }
}

/// One page of RFPs.
#[derive(Debug, Clone, Serialize)]
pub struct RfpPage {
    pub items: Vec<Rfp>,
    pub pagination: Pagination,
}

// ---------------------------------------------------------------------------
// Criteria
// ---------------------------------------------------------------------------

/// Fully validated list request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RfpCriteria {
    pub filter: RfpFilter,
    pub sort: RfpSort,
    pub page: PageRequest,
}

impl RfpCriteria {
    pub fn from_params(params: RfpListParams) -> CoreResult<Self> {
        let status = params
            .status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(RfpStatus::parse)
            .transpose()?;

        for (name, value) in [("min_amount", params.min_amount), ("max_amount", params.max_amount)] {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(CoreError::Validation(format!("{name} must be a finite number")));
            }
        }
        if let (Some(min), Some(max)) = (params.min_amount, params.max_amount) {
            if min > max {
                return Err(CoreError::Validation(
                    "min_amount must not exceed max_amount".into(),
                ));
            }
        }

        let deadline_from = parse_optional_date("start_date", params.start_date.as_deref())?;
        let deadline_to = parse_optional_date("end_date", params.end_date.as_deref())?;
        if let (Some(from), Some(to)) = (deadline_from, deadline_to) {
            if from > to {
                return Err(CoreError::Validation(
                    "start_date must not be after end_date".into(),
                ));
            }
        }

        let search = params
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let mut sort = RfpSort::default();
        if let Some(field) = params.sort_by.as_deref().filter(|s| !s.is_empty()) {
            sort.field = SortField::parse(field)?;
        }
        if let Some(direction) = params.sort_order.as_deref().filter(|s| !s.is_empty()) {
            sort.direction = SortDirection::parse(direction)?;
        }

        Ok(Self {
            filter: RfpFilter {
                vendor_id: params.vendor,
                status,
                min_amount: params.min_amount,
                max_amount: params.max_amount,
                deadline_from,
                deadline_to,
                search,
            },
            sort,
            page: PageRequest::new(params.page, params.limit)?,
        })
    }
}

fn parse_optional_date(field: &str, value: Option<&str>) -> CoreResult<Option<Timestamp>> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_date(field, v))
        .transpose()
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// List RFPs visible to `actor`.
///
/// Non-admin callers are pinned to their own vendor id whatever the
/// criteria say.
pub async fn list(
    store: &dyn RfpStore,
    actor: &Actor,
    mut criteria: RfpCriteria,
) -> CoreResult<RfpPage> {
    criteria.filter.vendor_id = policy::scope_vendor_filter(actor, criteria.filter.vendor_id);
    run(store, criteria).await
}

/// List the RFPs of one vendor. Admins, or the vendor itself.
pub async fn list_for_vendor(
    store: &dyn RfpStore,
    actor: &Actor,
    vendor_id: DbId,
    mut criteria: RfpCriteria,
) -> CoreResult<RfpPage> {
    policy::ensure_vendor_view(actor, vendor_id)?;
    criteria.filter.vendor_id = Some(vendor_id);
    run(store, criteria).await
}

async fn run(store: &dyn RfpStore, criteria: RfpCriteria) -> CoreResult<RfpPage> {
    let (items, total) = store
        .list(&criteria.filter, criteria.sort, criteria.page)
        .await?;
    Ok(RfpPage {
        items,
        pagination: Pagination::new(total, criteria.page),
    })
}
