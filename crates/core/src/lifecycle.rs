//! RFP lifecycle: create, read, patch, delete.
//!
//! Every status change is recorded in the status history with the acting
//! user. Any status may move to any other status; only *who* may trigger a
//! change is restricted (see [`crate::policy`]). The owning vendor is fixed
//! at creation.

use serde::Deserialize;

use crate::error::{CoreError, CoreResult};
use crate::policy::{self, RfpOperation};
use crate::rfp::{
    parse_date, validate_amount, validate_description, validate_title, Rfp, RfpComment,
    RfpStatus, StatusHistoryEntry, ENTITY_RFP,
};
use crate::roles::Actor;
use crate::store::{RfpChanges, RfpDraft, RfpStore};
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Create request. Fields are optional so missing ones surface as
/// validation errors rather than deserialization failures.
///
/// A `vendor_id` in the request body is ignored; the owner is the caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewRfp {
    pub title: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub submission_deadline: Option<String>,
    pub status: Option<String>,
}

/// Patch request. Absent fields are left unchanged.
///
/// `vendor_id`, `id` and `created_at` are not assignable and are dropped
/// silently during deserialization. `comment` is appended to the comment
/// log rather than assigned.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RfpPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub submission_deadline: Option<String>,
    pub status: Option<String>,
    pub comment: Option<String>,
}

// ---------------------------------------------------------------------------
// Pure planning
// ---------------------------------------------------------------------------

/// Validate a create request into an insertable draft owned by `actor`.
pub fn prepare_create(actor: &Actor, input: NewRfp, now: Timestamp) -> CoreResult<RfpDraft> {
    let title = validate_title(input.title.as_deref().unwrap_or_default())?;
    let description = validate_description(input.description.as_deref().unwrap_or_default())?;
    let amount = input
        .amount
        .ok_or_else(|| CoreError::Validation("amount is required".into()))
        .and_then(validate_amount)?;
    let submission_deadline = match input.submission_deadline.as_deref() {
        Some(raw) if !raw.trim().is_empty() => parse_date("submission_deadline", raw)?,
        _ => {
            return Err(CoreError::Validation(
                "submission_deadline is required".into(),
            ))
        }
    };
    let status = match input.status.as_deref() {
        Some(raw) => RfpStatus::parse(raw)?,
        None => RfpStatus::Draft,
    };

    Ok(RfpDraft {
        title,
        description,
        amount,
        submission_deadline,
        status,
        vendor_id: actor.id,
        initial_history: StatusHistoryEntry {
            status,
            changed_at: now,
            changed_by: actor.id,
        },
    })
}

/// Validate a patch against the current record and compute the changes.
///
/// A status equal to the current one is not a transition and produces no
/// history entry. Blank comments are ignored.
pub fn plan_update(
    current: &Rfp,
    actor: &Actor,
    patch: RfpPatch,
    now: Timestamp,
) -> CoreResult<RfpChanges> {
    let mut changes = RfpChanges {
        title: patch.title.as_deref().map(validate_title).transpose()?,
        description: patch
            .description
            .as_deref()
            .map(validate_description)
            .transpose()?,
        amount: patch.amount.map(validate_amount).transpose()?,
        submission_deadline: patch
            .submission_deadline
            .as_deref()
            .map(|raw| parse_date("submission_deadline", raw))
            .transpose()?,
        ..Default::default()
    };

    if let Some(raw) = patch.status.as_deref() {
        let next = RfpStatus::parse(raw)?;
        if next != current.status {
            changes.history_entry = Some(StatusHistoryEntry {
                status: next,
                changed_at: now,
                changed_by: actor.id,
            });
            changes.status = Some(next);
        }
    }

    if let Some(text) = patch.comment.filter(|c| !c.trim().is_empty()) {
        changes.comment = Some(RfpComment {
            text,
            author: actor.id,
            created_at: now,
        });
    }

    Ok(changes)
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Create an RFP owned by `actor`.
pub async fn create(
    store: &dyn RfpStore,
    actor: &Actor,
    input: NewRfp,
    now: Timestamp,
) -> CoreResult<Rfp> {
    let draft = prepare_create(actor, input, now)?;
    store.insert(draft).await
}

/// Fetch an RFP the actor may read.
pub async fn get(store: &dyn RfpStore, actor: &Actor, id: DbId) -> CoreResult<Rfp> {
    let rfp = load(store, id).await?;
    policy::ensure_access(actor, &rfp, RfpOperation::Read)?;
    Ok(rfp)
}

/// Patch an RFP. Order of checks: existence, permission, then validation.
pub async fn update(
    store: &dyn RfpStore,
    actor: &Actor,
    id: DbId,
    patch: RfpPatch,
    now: Timestamp,
) -> CoreResult<Rfp> {
    let current = load(store, id).await?;
    policy::ensure_access(actor, &current, RfpOperation::Update)?;
    let changes = plan_update(&current, actor, patch, now)?;

    store
        .update(id, changes)
        .await?
        .ok_or(CoreError::NotFound {
            entity: ENTITY_RFP,
            id,
        })
}

/// Hard-delete an RFP together with its history and comments.
pub async fn delete(store: &dyn RfpStore, actor: &Actor, id: DbId) -> CoreResult<()> {
    let current = load(store, id).await?;
    policy::ensure_access(actor, &current, RfpOperation::Delete)?;
    if store.delete(id).await? {
        Ok(())
    } else {
        Err(CoreError::NotFound {
            entity: ENTITY_RFP,
            id,
        })
    }
}

async fn load(store: &dyn RfpStore, id: DbId) -> CoreResult<Rfp> {
    store.find_by_id(id).await?.ok_or(CoreError::NotFound {
        entity: ENTITY_RFP,
        id,
    })
}
