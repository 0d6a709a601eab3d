//! Storage traits consumed by the core operations.
//!
//! The PostgreSQL implementations live in `procura_db::repositories`; an
//! in-memory implementation lives in `procura_db::memory`. Traits are
//! object-safe (`async_trait`) so the API can hold them as `Arc<dyn ...>`.
//!
//! Aggregate methods return raw grouped sums; rounding, zero-filling and
//! percentages are applied by [`crate::analytics`].

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::query::{PageRequest, RfpFilter, RfpSort};
use crate::rfp::{Rfp, RfpComment, RfpStatus, StatusHistoryEntry};
use crate::roles::Role;
use crate::types::{DbId, Timestamp};
use crate::user::{NewUser, User};
use crate::vendor_settings::{SaveVendorSettings, VendorIntegrationSettings};

// ---------------------------------------------------------------------------
// Write models
// ---------------------------------------------------------------------------

/// A validated RFP ready to be inserted, including its creation history entry.
#[derive(Debug, Clone, PartialEq)]
pub struct RfpDraft {
    pub title: String,
    pub description: String,
    pub amount: f64,
    pub submission_deadline: Timestamp,
    pub status: RfpStatus,
    pub vendor_id: DbId,
    pub initial_history: StatusHistoryEntry,
}

/// A validated set of changes to an existing RFP.
///
/// `history_entry` is present exactly when `status` changes value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RfpChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub submission_deadline: Option<Timestamp>,
    pub status: Option<RfpStatus>,
    pub history_entry: Option<StatusHistoryEntry>,
    pub comment: Option<RfpComment>,
}

impl RfpChanges {
    pub fn is_empty(&self) -> bool {
        *self == RfpChanges::default()
    }

    /// Apply the changes to an in-memory record.
    ///
    /// The history entry is appended before the status is assigned.
    /// `updated_at` is left to the caller.
    pub fn apply_to(&self, rfp: &mut Rfp) {
        if let Some(title) = &self.title {
            rfp.title = title.clone();
        }
        if let Some(description) = &self.description {
            rfp.description = description.clone();
        }
        if let Some(amount) = self.amount {
            rfp.amount = amount;
        }
        if let Some(deadline) = self.submission_deadline {
            rfp.submission_deadline = deadline;
        }
        if let Some(entry) = &self.history_entry {
            rfp.status_history.push(entry.clone());
        }
        if let Some(status) = self.status {
            rfp.status = status;
        }
        if let Some(comment) = &self.comment {
            rfp.comments.push(comment.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregate rows
// ---------------------------------------------------------------------------

/// Count and summed amount for one status.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusTotal {
    pub status: RfpStatus,
    pub count: i64,
    pub total_value: f64,
}

/// Awarded RFPs for one calendar month (1-12) of a year.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthTotal {
    pub month: u32,
    pub total: f64,
    pub count: i64,
}

/// RFPs created in one year/month bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthBucket {
    pub year: i32,
    pub month: u32,
    pub count: i64,
    pub total_amount: f64,
}

/// Per-vendor counts and sums across all of the vendor's RFPs.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorTotal {
    pub vendor_id: DbId,
    pub total_rfps: i64,
    pub total_value: f64,
    pub submitted: i64,
    pub awarded: i64,
    pub rejected: i64,
    pub awarded_value: f64,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Persistence for RFPs with their history and comments.
#[async_trait]
pub trait RfpStore: Send + Sync {
    /// Insert a new RFP with its creation history entry.
    async fn insert(&self, draft: RfpDraft) -> CoreResult<Rfp>;

    async fn find_by_id(&self, id: DbId) -> CoreResult<Option<Rfp>>;

    /// Apply changes and refresh `updated_at`. `None` if the RFP is gone.
    async fn update(&self, id: DbId, changes: RfpChanges) -> CoreResult<Option<Rfp>>;

    /// Hard delete, including history and comments. `false` if absent.
    async fn delete(&self, id: DbId) -> CoreResult<bool>;

    /// One page of matching RFPs plus the total number of matches.
    async fn list(
        &self,
        filter: &RfpFilter,
        sort: RfpSort,
        page: PageRequest,
    ) -> CoreResult<(Vec<Rfp>, i64)>;

    /// Count and amount per status present in the data, optionally for one vendor.
    async fn status_totals(&self, vendor_id: Option<DbId>) -> CoreResult<Vec<StatusTotal>>;

    /// Awarded RFPs grouped by the month of `updated_at` within `year`.
    async fn awarded_by_month(&self, year: i32) -> CoreResult<Vec<MonthTotal>>;

    /// RFPs created at or after `since`, grouped by year and month, ascending.
    async fn created_by_month(
        &self,
        since: Timestamp,
        vendor_id: Option<DbId>,
    ) -> CoreResult<Vec<MonthBucket>>;

    /// Totals for every vendor owning at least one RFP.
    async fn vendor_totals(&self) -> CoreResult<Vec<VendorTotal>>;
}

/// User directory lookups.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is already registered.
    async fn create(&self, input: NewUser) -> CoreResult<User>;

    async fn find_by_id(&self, id: DbId) -> CoreResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>>;

    /// Users for the given ids; unknown ids are skipped.
    async fn find_many(&self, ids: &[DbId]) -> CoreResult<Vec<User>>;

    async fn count_by_role(&self, role: Role) -> CoreResult<i64>;
}

/// Integration settings keyed by vendor id.
#[async_trait]
pub trait VendorSettingsStore: Send + Sync {
    async fn get(&self, vendor_id: DbId) -> CoreResult<Option<VendorIntegrationSettings>>;

    /// Create or update. Sections left as `None` keep their stored value.
    async fn upsert(
        &self,
        vendor_id: DbId,
        input: &SaveVendorSettings,
    ) -> CoreResult<VendorIntegrationSettings>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn sample() -> Rfp {
        let now = Utc::now();
        Rfp {
            id: 1,
            title: "Chairs".into(),
            description: "Ergonomic chairs".into(),
            amount: 250.0,
            submission_deadline: now,
            status: RfpStatus::Draft,
            vendor_id: 3,
            status_history: vec![StatusHistoryEntry {
                status: RfpStatus::Draft,
                changed_at: now,
                changed_by: 3,
            }],
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_default_changes_are_empty() {
        assert!(RfpChanges::default().is_empty());
        let changes = RfpChanges {
            amount: Some(1.0),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }

    #[test]
    fn test_apply_appends_history_and_sets_status() {
        let mut rfp = sample();
        let later = rfp.created_at + Duration::minutes(5);
        let changes = RfpChanges {
            amount: Some(300.0),
            status: Some(RfpStatus::Submitted),
            history_entry: Some(StatusHistoryEntry {
                status: RfpStatus::Submitted,
                changed_at: later,
                changed_by: 3,
            }),
            comment: Some(RfpComment {
                text: "ready".into(),
                author: 3,
                created_at: later,
            }),
            ..Default::default()
        };
        changes.apply_to(&mut rfp);

        assert_eq!(rfp.amount, 300.0);
        assert_eq!(rfp.status, RfpStatus::Submitted);
        assert_eq!(rfp.status_history.len(), 2);
        assert_eq!(rfp.status_history.last().unwrap().status, rfp.status);
        assert_eq!(rfp.comments.len(), 1);
        assert_eq!(rfp.vendor_id, 3);
    }
}
