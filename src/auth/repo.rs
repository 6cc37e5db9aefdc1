use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};

use super::{
    repo_types::{User, UserRow},
    role::{Role, RoleError},
};

/// Postgres `unique_violation` SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user with this email already exists")]
    Duplicate,
    #[error("user {0} not found after insert")]
    Missing(String),
    #[error("stored user is invalid: {0}")]
    CorruptRow(#[from] RoleError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// `Ok(None)` means no such user; errors are reserved for store failures.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Inserts a user and returns it as read back from the store.
    /// An email conflict is reported as `StoreError::Duplicate`.
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, role, created_at
            FROM users
            WHERE email = $1
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| {
            error!(error = %e, "find_by_email failed");
            StoreError::Database(e)
        })?;

        row.map(User::try_from).transpose().map_err(StoreError::from)
    }

    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, role)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(role.as_str())
        .execute(&self.db)
        .await
        .map_err(insert_error)?;

        self.find_by_email(email)
            .await?
            .ok_or_else(|| StoreError::Missing(email.to_string()))
    }
}

/// Classifies a failed `INSERT INTO users`: the unique email index turns
/// into `Duplicate`, anything else stays a database failure.
fn insert_error(e: sqlx::Error) -> StoreError {
    if is_unique_violation(&e) {
        info!("insert hit unique email index");
        StoreError::Duplicate
    } else {
        error!(error = %e, "create user failed");
        StoreError::Database(e)
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == UNIQUE_VIOLATION)
        .unwrap_or(false)
}
