//! Row type for the `users` table.

use procura_core::error::{CoreError, CoreResult};
use procura_core::roles::Role;
use procura_core::types::{DbId, Timestamp};
use procura_core::user::User;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<UserRow> for User {
    type Error = CoreError;

    fn try_from(row: UserRow) -> CoreResult<Self> {
        let role = Role::parse(&row.role)
            .map_err(|_| CoreError::Internal(format!("unknown role in database: {}", row.role)))?;
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
