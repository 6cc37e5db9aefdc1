use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::role::{Role, RoleError};

/// Raw `users` row as stored in postgres.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: OffsetDateTime,
}

/// User record with a validated role.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,                     // assigned by the store
    pub email: String,                // unique lookup key
    #[serde(skip_serializing)]
    pub password_hash: String,        // Argon2 PHC string, never exposed in JSON
    pub role: Role,
    pub created_at: OffsetDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = RoleError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            role: row.role.parse()?,
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}
