//! Authorization rules for RFPs and analytics.
//!
//! Admins may do anything. A vendor may only touch RFPs whose `vendor_id`
//! equals its own id. Cross-vendor access is reported as `Forbidden`; the
//! existence of another vendor's RFP is not hidden.

use crate::error::{CoreError, CoreResult};
use crate::rfp::Rfp;
use crate::roles::Actor;
use crate::types::DbId;

/// Operations gated per RFP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RfpOperation {
    Read,
    Update,
    Delete,
}

impl RfpOperation {
    fn verb(self) -> &'static str {
        match self {
            RfpOperation::Read => "view",
            RfpOperation::Update => "update",
            RfpOperation::Delete => "delete",
        }
    }
}

/// Whether `actor` may perform `op` on `rfp`.
pub fn can_access(actor: &Actor, rfp: &Rfp, op: RfpOperation) -> bool {
    match op {
        RfpOperation::Read | RfpOperation::Update | RfpOperation::Delete => {
            actor.is_admin() || actor.id == rfp.vendor_id
        }
    }
}

/// Like [`can_access`], returning `Forbidden` when denied.
pub fn ensure_access(actor: &Actor, rfp: &Rfp, op: RfpOperation) -> CoreResult<()> {
    if can_access(actor, rfp, op) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "Not authorized to {} this RFP",
            op.verb()
        )))
    }
}

/// Only admins may list RFPs across all vendors.
pub fn can_list_all(actor: &Actor) -> bool {
    actor.is_admin()
}

/// Resolve the vendor filter for a listing request.
///
/// Admins keep whatever they asked for (including no filter). Everyone else
/// is pinned to their own id regardless of the requested value.
pub fn scope_vendor_filter(actor: &Actor, requested: Option<DbId>) -> Option<DbId> {
    if can_list_all(actor) {
        requested
    } else {
        Some(actor.id)
    }
}

/// Require the admin role.
pub fn ensure_admin(actor: &Actor) -> CoreResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(CoreError::Forbidden("Admin role required".into()))
    }
}

/// Per-vendor views (vendor analytics, vendor listing, integration
/// settings) are open to admins and to the vendor itself.
pub fn ensure_vendor_view(actor: &Actor, vendor_id: DbId) -> CoreResult<()> {
    if actor.is_admin() || actor.id == vendor_id {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "Not authorized to access this vendor's data".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfp::{RfpStatus, StatusHistoryEntry};
    use assert_matches::assert_matches;
    use chrono::Utc;

    fn rfp_owned_by(vendor_id: DbId) -> Rfp {
        let now = Utc::now();
        Rfp {
            id: 1,
            title: "Desks".into(),
            description: "Office desks".into(),
            amount: 1000.0,
            submission_deadline: now,
            status: RfpStatus::Draft,
            vendor_id,
            status_history: vec![StatusHistoryEntry {
                status: RfpStatus::Draft,
                changed_at: now,
                changed_by: vendor_id,
            }],
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    const OPS: [RfpOperation; 3] = [
        RfpOperation::Read,
        RfpOperation::Update,
        RfpOperation::Delete,
    ];

    #[test]
    fn test_admin_can_do_everything() {
        let rfp = rfp_owned_by(10);
        for op in OPS {
            assert!(can_access(&Actor::admin(99), &rfp, op));
        }
    }

    #[test]
    fn test_owner_can_do_everything() {
        let rfp = rfp_owned_by(10);
        for op in OPS {
            assert!(can_access(&Actor::vendor(10), &rfp, op));
        }
    }

    #[test]
    fn test_other_vendor_is_forbidden() {
        let rfp = rfp_owned_by(10);
        for op in OPS {
            assert!(!can_access(&Actor::vendor(11), &rfp, op));
            assert_matches!(
                ensure_access(&Actor::vendor(11), &rfp, op),
                Err(CoreError::Forbidden(_))
            );
        }
    }

    #[test]
    fn test_vendor_filter_is_forced_for_vendors() {
        let vendor = Actor::vendor(5);
        assert_eq!(scope_vendor_filter(&vendor, Some(6)), Some(5));
        assert_eq!(scope_vendor_filter(&vendor, None), Some(5));
    }

    #[test]
    fn test_vendor_filter_is_passed_through_for_admins() {
        let admin = Actor::admin(1);
        assert_eq!(scope_vendor_filter(&admin, Some(6)), Some(6));
        assert_eq!(scope_vendor_filter(&admin, None), None);
    }

    #[test]
    fn test_vendor_view_rules() {
        assert!(ensure_vendor_view(&Actor::admin(1), 7).is_ok());
        assert!(ensure_vendor_view(&Actor::vendor(7), 7).is_ok());
        assert_matches!(
            ensure_vendor_view(&Actor::vendor(8), 7),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn test_ensure_admin() {
        assert!(ensure_admin(&Actor::admin(1)).is_ok());
        assert_matches!(ensure_admin(&Actor::vendor(1)), Err(CoreError::Forbidden(_)));
    }
}
