//! RFP entity, status enum, and field validation.
//!
//! An RFP carries two append-only logs: the status history (one entry at
//! creation plus one per status change) and free-text comments. The last
//! history entry always matches the current `status`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{DbId, Timestamp};

/// Entity name used in `CoreError::NotFound`.
pub const ENTITY_RFP: &str = "RFP";

/// Milliseconds in one day, used for `days_remaining`.
const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of an RFP. No other value is ever persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RfpStatus {
    Draft,
    Submitted,
    Awarded,
    Rejected,
}

impl RfpStatus {
    /// All statuses in display order.
    pub const ALL: [RfpStatus; 4] = [
        RfpStatus::Draft,
        RfpStatus::Submitted,
        RfpStatus::Awarded,
        RfpStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RfpStatus::Draft => "Draft",
            RfpStatus::Submitted => "Submitted",
            RfpStatus::Awarded => "Awarded",
            RfpStatus::Rejected => "Rejected",
        }
    }

    /// Parse a status name. Matching is exact (`"Draft"`, not `"draft"`).
    pub fn parse(value: &str) -> CoreResult<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == value)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid status '{value}'. Must be one of: Draft, Submitted, Awarded, Rejected"
                ))
            })
    }
}

impl std::fmt::Display for RfpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// One entry of the append-only status log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusHistoryEntry {
    pub status: RfpStatus,
    pub changed_at: Timestamp,
    pub changed_by: DbId,
}

/// A comment attached to an RFP.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RfpComment {
    pub text: String,
    pub author: DbId,
    pub created_at: Timestamp,
}

/// A persisted RFP together with its history and comments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rfp {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub amount: f64,
    pub submission_deadline: Timestamp,
    pub status: RfpStatus,
    pub vendor_id: DbId,
    pub status_history: Vec<StatusHistoryEntry>,
    pub comments: Vec<RfpComment>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Rfp {
    /// Whole days until the submission deadline, rounded up, never negative.
    pub fn days_remaining(&self, now: Timestamp) -> i64 {
        days_remaining(self.submission_deadline, now)
    }
}

/// `ceil((deadline - now) / 1 day)`, floored at 0.
pub fn days_remaining(deadline: Timestamp, now: Timestamp) -> i64 {
    let ms = (deadline - now).num_milliseconds();
    if ms <= 0 {
        0
    } else {
        (ms + MS_PER_DAY - 1) / MS_PER_DAY
    }
}

// ---------------------------------------------------------------------------
// Field validation
// ---------------------------------------------------------------------------

/// Trim and require a non-empty title.
pub fn validate_title(title: &str) -> CoreResult<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("title must not be empty".into()));
    }
    Ok(trimmed.to_string())
}

/// Require a description with at least one non-whitespace character.
pub fn validate_description(description: &str) -> CoreResult<String> {
    if description.trim().is_empty() {
        return Err(CoreError::Validation("description must not be empty".into()));
    }
    Ok(description.to_string())
}

/// Largest accepted RFP amount. Sums of many such amounts stay finite in
/// `f64` and `DOUBLE PRECISION`.
pub const MAX_AMOUNT: f64 = 1e13;

/// Require a finite amount in `0..=MAX_AMOUNT`.
pub fn validate_amount(amount: f64) -> CoreResult<f64> {
    if !amount.is_finite() {
        return Err(CoreError::Validation("amount must be a finite number".into()));
    }
    if amount < 0.0 {
        return Err(CoreError::Validation("amount must be >= 0".into()));
    }
    if amount > MAX_AMOUNT {
        return Err(CoreError::Validation(format!(
            "amount must not exceed {MAX_AMOUNT:e}"
        )));
    }
    Ok(amount)
}

/// Parse a date or timestamp supplied by a caller.
///
/// Accepts RFC 3339 (`2025-01-01T12:00:00Z`), a naive timestamp
/// (`2025-01-01T12:00:00`, read as UTC) or a plain date (`2025-01-01`,
/// midnight UTC).
pub fn parse_date(field: &str, value: &str) -> CoreResult<Timestamp> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(CoreError::Validation(format!(
        "{field} must be a date (YYYY-MM-DD) or RFC 3339 timestamp, got '{value}'"
    )))
}
