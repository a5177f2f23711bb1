//! PostgreSQL implementation of AppCatalog.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{AppId, DomainError};
use crate::domain::payment::AppListing;
use crate::ports::AppCatalog;

use super::db_error;

pub struct PostgresAppCatalog {
    pool: PgPool,
}

impl PostgresAppCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AppRow {
    id: Uuid,
    name: String,
    price: i64,
    currency: Option<String>,
    is_paid: bool,
}

impl From<AppRow> for AppListing {
    fn from(row: AppRow) -> Self {
        AppListing {
            id: AppId::from_uuid(row.id),
            name: row.name,
            price: row.price,
            currency: row.currency,
            is_paid: row.is_paid,
        }
    }
}

#[async_trait]
impl AppCatalog for PostgresAppCatalog {
    async fn find_by_id(&self, id: &AppId) -> Result<Option<AppListing>, DomainError> {
        let row: Option<AppRow> =
            sqlx::query_as("SELECT id, name, price, currency, is_paid FROM apps WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to load app", e))?;

        Ok(row.map(AppListing::from))
    }
}
