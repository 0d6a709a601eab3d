//! Well-known role names and the authenticated actor.
//!
//! These must match the `ck_users_role` check constraint in
//! `20260301000001_create_users_table.sql`.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_VENDOR: &str = "vendor";

/// All valid role values.
pub const VALID_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_VENDOR];

/// Role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Vendor,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => ROLE_ADMIN,
            Role::Vendor => ROLE_VENDOR,
        }
    }

    /// Parse a role name as stored in the database or carried in a token.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            ROLE_ADMIN => Ok(Role::Admin),
            ROLE_VENDOR => Ok(Role::Vendor),
            other => Err(CoreError::Validation(format!(
                "Invalid role '{other}'. Must be one of: {}",
                VALID_ROLES.join(", ")
            ))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The caller of a core operation, as established by the auth layer.
///
/// The core trusts `id` and `role` as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: DbId,
    pub role: Role,
}

impl Actor {
    pub fn admin(id: DbId) -> Self {
        Self { id, role: Role::Admin }
    }

    pub fn vendor(id: DbId) -> Self {
        Self { id, role: Role::Vendor }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
