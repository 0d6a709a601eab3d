//! User accounts as seen by the RFP core.
//!
//! Only `id` and `role` feed authorization; name and email are attached to
//! analytics reports.

use serde::Serialize;

use crate::roles::Role;
use crate::types::{DbId, Timestamp};

/// Entity name used in `CoreError::NotFound`.
pub const ENTITY_USER: &str = "User";

/// A stored user account. The password hash is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: DbId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Input for creating a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Emails are stored trimmed and lower-cased so lookups are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
