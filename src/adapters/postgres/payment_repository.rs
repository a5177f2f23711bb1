//! PostgreSQL implementation of PaymentRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::foundation::{
    AppId, DomainError, ErrorCode, PaymentId, Timestamp, UserId,
};
use crate::domain::payment::{DownloadToken, OrderId, PaymentRecord, PaymentStatus};
use crate::ports::{PaymentPage, PaymentQuery, PaymentRepository};

use super::{corrupt_row, db_error};

const SELECT_COLUMNS: &str = r#"
    SELECT id, order_id, app_id, user_id, buyer_name, buyer_email, amount, currency,
           payment_method, status, download_token, token_expires_at, checkout_token,
           checkout_url, gateway_transaction_id, gateway_transaction_status,
           gateway_fraud_status, gateway_response, error_message, verified_at,
           created_at, updated_at
    FROM payments
"#;

pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    order_id: String,
    app_id: Uuid,
    user_id: Option<String>,
    buyer_name: String,
    buyer_email: String,
    amount: i64,
    currency: String,
    payment_method: String,
    status: String,
    download_token: String,
    token_expires_at: DateTime<Utc>,
    checkout_token: Option<String>,
    checkout_url: Option<String>,
    gateway_transaction_id: Option<String>,
    gateway_transaction_status: Option<String>,
    gateway_fraud_status: Option<String>,
    gateway_response: Option<Value>,
    error_message: Option<String>,
    verified_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for PaymentRecord {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let status: PaymentStatus = row.status.parse().map_err(corrupt_row)?;
        let order_id = OrderId::new(row.order_id).map_err(corrupt_row)?;
        // Blank ids read as guest checkouts.
        let user_id = row.user_id.and_then(|id| UserId::new(id).ok());

        Ok(PaymentRecord {
            id: PaymentId::from_uuid(row.id),
            order_id,
            app_id: AppId::from_uuid(row.app_id),
            user_id,
            buyer_name: row.buyer_name,
            buyer_email: row.buyer_email,
            amount: row.amount,
            currency: row.currency,
            payment_method: row.payment_method,
            status,
            download_token: DownloadToken::from_stored(row.download_token),
            token_expires_at: Timestamp::from_datetime(row.token_expires_at),
            checkout_token: row.checkout_token,
            checkout_url: row.checkout_url,
            gateway_transaction_id: row.gateway_transaction_id,
            gateway_transaction_status: row.gateway_transaction_status,
            gateway_fraud_status: row.gateway_fraud_status,
            gateway_response: row.gateway_response,
            error_message: row.error_message,
            verified_at: row.verified_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

/// Appends the WHERE clause shared by the page and count queries.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &PaymentQuery) {
    builder.push(" WHERE TRUE");
    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(search) = &query.search {
        let pattern = format!("%{}%", search);
        builder
            .push(" AND (buyer_email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR buyer_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR order_id ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn insert(&self, record: &PaymentRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, order_id, app_id, user_id, buyer_name, buyer_email, amount, currency,
                payment_method, status, download_token, token_expires_at, checkout_token,
                checkout_url, gateway_transaction_id, gateway_transaction_status,
                gateway_fraud_status, gateway_response, error_message, verified_at,
                created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22
            )
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.order_id.as_str())
        .bind(record.app_id.as_uuid())
        .bind(record.user_id.as_ref().map(UserId::as_str))
        .bind(&record.buyer_name)
        .bind(&record.buyer_email)
        .bind(record.amount)
        .bind(&record.currency)
        .bind(&record.payment_method)
        .bind(record.status.as_str())
        .bind(record.download_token.as_str())
        .bind(record.token_expires_at.as_datetime())
        .bind(&record.checkout_token)
        .bind(&record.checkout_url)
        .bind(&record.gateway_transaction_id)
        .bind(&record.gateway_transaction_status)
        .bind(&record.gateway_fraud_status)
        .bind(&record.gateway_response)
        .bind(&record.error_message)
        .bind(record.verified_at.as_ref().map(Timestamp::as_datetime))
        .bind(record.created_at.as_datetime())
        .bind(record.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to insert payment", e))?;

        Ok(())
    }

    async fn update(&self, record: &PaymentRecord) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE payments SET
                status = $2,
                checkout_token = $3,
                checkout_url = $4,
                gateway_transaction_id = $5,
                gateway_transaction_status = $6,
                gateway_fraud_status = $7,
                gateway_response = $8,
                error_message = $9,
                verified_at = $10,
                updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.status.as_str())
        .bind(&record.checkout_token)
        .bind(&record.checkout_url)
        .bind(&record.gateway_transaction_id)
        .bind(&record.gateway_transaction_status)
        .bind(&record.gateway_fraud_status)
        .bind(&record.gateway_response)
        .bind(&record.error_message)
        .bind(record.verified_at.as_ref().map(Timestamp::as_datetime))
        .bind(record.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update payment", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::PaymentNotFound,
                format!("Payment {} not found", record.id),
            ));
        }

        Ok(())
    }

    async fn update_if_status(
        &self,
        record: &PaymentRecord,
        expected: PaymentStatus,
    ) -> Result<bool, DomainError> {
        // Rows written before the rename still carry 'paid'.
        let expected_labels: Vec<String> = match expected {
            PaymentStatus::Verified => vec!["verified".to_string(), "paid".to_string()],
            other => vec![other.as_str().to_string()],
        };

        let result = sqlx::query(
            r#"
            UPDATE payments SET
                status = $2,
                checkout_token = $3,
                checkout_url = $4,
                gateway_transaction_id = $5,
                gateway_transaction_status = $6,
                gateway_fraud_status = $7,
                gateway_response = $8,
                error_message = $9,
                verified_at = $10,
                updated_at = $11
            WHERE id = $1 AND status = ANY($12)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.status.as_str())
        .bind(&record.checkout_token)
        .bind(&record.checkout_url)
        .bind(&record.gateway_transaction_id)
        .bind(&record.gateway_transaction_status)
        .bind(&record.gateway_fraud_status)
        .bind(&record.gateway_response)
        .bind(&record.error_message)
        .bind(record.verified_at.as_ref().map(Timestamp::as_datetime))
        .bind(record.updated_at.as_datetime())
        .bind(expected_labels)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update payment", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<PaymentRecord>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!("{} WHERE id = $1", SELECT_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to load payment", e))?;

        row.map(PaymentRecord::try_from).transpose()
    }

    async fn find_by_order_id(
        &self,
        order_id: &OrderId,
    ) -> Result<Option<PaymentRecord>, DomainError> {
        let row: Option<PaymentRow> =
            sqlx::query_as(&format!("{} WHERE order_id = $1", SELECT_COLUMNS))
                .bind(order_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to load payment", e))?;

        row.map(PaymentRecord::try_from).transpose()
    }

    async fn list(&self, query: &PaymentQuery) -> Result<PaymentPage, DomainError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM payments");
        push_filters(&mut count, query);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("Failed to count payments", e))?;

        let mut page = QueryBuilder::<Postgres>::new(SELECT_COLUMNS);
        push_filters(&mut page, query);
        page.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.offset);
        let rows: Vec<PaymentRow> = page
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list payments", e))?;

        let items = rows
            .into_iter()
            .map(PaymentRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PaymentPage { items, total })
    }
}
