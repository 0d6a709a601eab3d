//! Rows for `rfps`, `rfp_status_history`, `rfp_comments` and the
//! aggregate queries over them.

use procura_core::error::{CoreError, CoreResult};
use procura_core::rfp::{Rfp, RfpComment, RfpStatus, StatusHistoryEntry};
use procura_core::store::{MonthBucket, MonthTotal, StatusTotal, VendorTotal};
use procura_core::types::{DbId, Timestamp};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity rows
// ---------------------------------------------------------------------------

/// A row of `rfps` without its history or comments.
#[derive(Debug, Clone, FromRow)]
pub struct RfpRow {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub amount: f64,
    pub submission_deadline: Timestamp,
    pub status: String,
    pub vendor_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl RfpRow {
    /// Assemble the full record from the row and its child rows.
    pub fn into_rfp(
        self,
        history: Vec<StatusHistoryRow>,
        comments: Vec<CommentRow>,
    ) -> CoreResult<Rfp> {
        let status_history = history
            .into_iter()
            .map(StatusHistoryRow::into_entry)
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(Rfp {
            id: self.id,
            title: self.title,
            description: self.description,
            amount: self.amount,
            submission_deadline: self.submission_deadline,
            status: stored_status(&self.status)?,
            vendor_id: self.vendor_id,
            status_history,
            comments: comments.into_iter().map(CommentRow::into_comment).collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct StatusHistoryRow {
    pub rfp_id: DbId,
    pub status: String,
    pub changed_at: Timestamp,
    pub changed_by: DbId,
}

impl StatusHistoryRow {
    pub fn into_entry(self) -> CoreResult<StatusHistoryEntry> {
        Ok(StatusHistoryEntry {
            status: stored_status(&self.status)?,
            changed_at: self.changed_at,
            changed_by: self.changed_by,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CommentRow {
    pub rfp_id: DbId,
    pub text: String,
    pub author: DbId,
    pub created_at: Timestamp,
}

impl CommentRow {
    pub fn into_comment(self) -> RfpComment {
        RfpComment {
            text: self.text,
            author: self.author,
            created_at: self.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregate rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, FromRow)]
pub struct StatusTotalRow {
    pub status: String,
    pub count: i64,
    pub total_value: f64,
}

impl StatusTotalRow {
    pub fn into_total(self) -> CoreResult<StatusTotal> {
        Ok(StatusTotal {
            status: stored_status(&self.status)?,
            count: self.count,
            total_value: self.total_value,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct MonthTotalRow {
    pub month: i32,
    pub total: f64,
    pub count: i64,
}

impl From<MonthTotalRow> for MonthTotal {
    fn from(row: MonthTotalRow) -> Self {
        MonthTotal {
            month: row.month as u32,
            total: row.total,
            count: row.count,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct MonthBucketRow {
    pub year: i32,
    pub month: i32,
    pub count: i64,
    pub total_amount: f64,
}

impl From<MonthBucketRow> for MonthBucket {
    fn from(row: MonthBucketRow) -> Self {
        MonthBucket {
            year: row.year,
            month: row.month as u32,
            count: row.count,
            total_amount: row.total_amount,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct VendorTotalRow {
    pub vendor_id: DbId,
    pub total_rfps: i64,
    pub total_value: f64,
    pub submitted: i64,
    pub awarded: i64,
    pub rejected: i64,
    pub awarded_value: f64,
}

impl From<VendorTotalRow> for VendorTotal {
    fn from(row: VendorTotalRow) -> Self {
        VendorTotal {
            vendor_id: row.vendor_id,
            total_rfps: row.total_rfps,
            total_value: row.total_value,
            submitted: row.submitted,
            awarded: row.awarded,
            rejected: row.rejected,
            awarded_value: row.awarded_value,
        }
    }
}

/// Status text read back from the database. The check constraint keeps this
/// to the four known values, so a mismatch is an internal error.
fn stored_status(value: &str) -> CoreResult<RfpStatus> {
    RfpStatus::parse(value)
        .map_err(|_| CoreError::Internal(format!("unknown RFP status in database: {value}")))
}
