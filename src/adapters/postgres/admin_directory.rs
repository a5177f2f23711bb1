//! PostgreSQL implementation of AdminDirectory.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, UserId};
use crate::ports::AdminDirectory;

use super::db_error;

pub struct PostgresAdminDirectory {
    pool: PgPool,
}

impl PostgresAdminDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminDirectory for PostgresAdminDirectory {
    async fn is_admin(&self, user_id: &UserId) -> Result<bool, DomainError> {
        let is_admin: Option<bool> = sqlx::query_scalar("SELECT is_admin FROM users WHERE id = $1")
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to load user", e))?;

        Ok(is_admin.unwrap_or(false))
    }
}
