//! PostgreSQL implementation of PurchaseRepository.
//!
//! `purchases_user_app_key` enforces one entitlement per user and app;
//! concurrent grants resolve through `ON CONFLICT DO NOTHING`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{AppId, DomainError, PaymentId, PurchaseId, Timestamp, UserId};
use crate::domain::payment::{OwnedApp, PurchaseRecord};
use crate::ports::{PurchaseRepository, SaveResult};

use super::{corrupt_row, db_error};

pub struct PostgresPurchaseRepository {
    pool: PgPool,
}

impl PostgresPurchaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PurchaseRow {
    id: Uuid,
    user_id: String,
    app_id: Uuid,
    payment_id: Uuid,
    purchased_at: DateTime<Utc>,
}

impl TryFrom<PurchaseRow> for PurchaseRecord {
    type Error = DomainError;

    fn try_from(row: PurchaseRow) -> Result<Self, Self::Error> {
        Ok(PurchaseRecord {
            id: PurchaseId::from_uuid(row.id),
            user_id: UserId::new(row.user_id).map_err(corrupt_row)?,
            app_id: AppId::from_uuid(row.app_id),
            payment_id: PaymentId::from_uuid(row.payment_id),
            purchased_at: Timestamp::from_datetime(row.purchased_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OwnedAppRow {
    id: Uuid,
    app_id: Uuid,
    app_name: String,
    payment_id: Uuid,
    purchased_at: DateTime<Utc>,
}

impl From<OwnedAppRow> for OwnedApp {
    fn from(row: OwnedAppRow) -> Self {
        OwnedApp {
            purchase_id: PurchaseId::from_uuid(row.id),
            app_id: AppId::from_uuid(row.app_id),
            app_name: row.app_name,
            payment_id: PaymentId::from_uuid(row.payment_id),
            purchased_at: Timestamp::from_datetime(row.purchased_at),
        }
    }
}

#[async_trait]
impl PurchaseRepository for PostgresPurchaseRepository {
    async fn insert_if_absent(&self, purchase: &PurchaseRecord) -> Result<SaveResult, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO purchases (id, user_id, app_id, payment_id, purchased_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT ON CONSTRAINT purchases_user_app_key DO NOTHING
            "#,
        )
        .bind(purchase.id.as_uuid())
        .bind(purchase.user_id.as_str())
        .bind(purchase.app_id.as_uuid())
        .bind(purchase.payment_id.as_uuid())
        .bind(purchase.purchased_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to record purchase", e))?;

        Ok(if result.rows_affected() == 0 {
            SaveResult::AlreadyExists
        } else {
            SaveResult::Inserted
        })
    }

    async fn find_by_user_and_app(
        &self,
        user_id: &UserId,
        app_id: &AppId,
    ) -> Result<Option<PurchaseRecord>, DomainError> {
        let row: Option<PurchaseRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, app_id, payment_id, purchased_at
            FROM purchases
            WHERE user_id = $1 AND app_id = $2
            "#,
        )
        .bind(user_id.as_str())
        .bind(app_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to load purchase", e))?;

        row.map(PurchaseRecord::try_from).transpose()
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<OwnedApp>, DomainError> {
        let rows: Vec<OwnedAppRow> = sqlx::query_as(
            r#"
            SELECT p.id, p.app_id, a.name AS app_name, p.payment_id, p.purchased_at
            FROM purchases p
            JOIN apps a ON a.id = p.app_id
            WHERE p.user_id = $1
            ORDER BY p.purchased_at DESC
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list purchases", e))?;

        Ok(rows.into_iter().map(OwnedApp::from).collect())
    }
}
