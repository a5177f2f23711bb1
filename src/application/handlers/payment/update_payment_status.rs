//! UpdatePaymentStatusHandler - operator status override.
//!
//! Overrides skip the gateway transition guard but share its side
//! effect: moving a payment into `verified` grants the entitlement.

use std::sync::Arc;

use crate::domain::foundation::{PaymentId, Timestamp, UserId};
use crate::domain::payment::{PaymentError, PaymentRecord, PaymentStatus, StatusChange};
use crate::ports::{AdminDirectory, PaymentRepository, PurchaseRepository};

use super::admin::ensure_admin;
use super::entitlement::{grant_entitlement, EntitlementOutcome};

#[derive(Debug, Clone)]
pub struct UpdatePaymentStatusCommand {
    pub requester: UserId,
    pub payment_id: String,
    /// Canonical label; `paid` is accepted for `verified`.
    pub status: String,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdatePaymentStatusResult {
    pub payment: PaymentRecord,
    pub change: StatusChange,
    pub entitlement: EntitlementOutcome,
}

pub struct UpdatePaymentStatusHandler {
    payments: Arc<dyn PaymentRepository>,
    purchases: Arc<dyn PurchaseRepository>,
    admins: Arc<dyn AdminDirectory>,
}

impl UpdatePaymentStatusHandler {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        purchases: Arc<dyn PurchaseRepository>,
        admins: Arc<dyn AdminDirectory>,
    ) -> Self {
        Self {
            payments,
            purchases,
            admins,
        }
    }

    pub async fn handle(
        &self,
        cmd: UpdatePaymentStatusCommand,
    ) -> Result<UpdatePaymentStatusResult, PaymentError> {
        ensure_admin(self.admins.as_ref(), &cmd.requester).await?;

        if cmd.payment_id.trim().is_empty() {
            return Err(PaymentError::validation(
                "payment_id",
                "Missing required field: payment_id",
            ));
        }
        let payment_id: PaymentId = cmd
            .payment_id
            .parse()
            .map_err(|_| PaymentError::validation("payment_id", "payment_id must be a UUID"))?;
        let target: PaymentStatus = cmd.status.parse()?;

        let mut record = self
            .payments
            .find_by_id(&payment_id)
            .await?
            .ok_or_else(|| PaymentError::not_found("Payment not found"))?;

        let change = record.override_status(target, cmd.transaction_id, Timestamp::now());
        self.payments
            .update(&record)
            .await
            .map_err(|e| PaymentError::persistence(e.to_string()))?;

        tracing::info!(
            order_id = %record.order_id,
            admin = %cmd.requester,
            status = %record.status,
            "Payment status overridden by operator"
        );

        let entitlement = match change {
            StatusChange::Transitioned {
                to: PaymentStatus::Verified,
                ..
            } => grant_entitlement(self.purchases.as_ref(), &record).await,
            _ => EntitlementOutcome::Skipped,
        };

        Ok(UpdatePaymentStatusResult {
            payment: record,
            change,
            entitlement,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryMarketStore;
    use crate::domain::foundation::AppId;
    use crate::domain::payment::{AppListing, BuyerDetails};

    fn admin() -> UserId {
        UserId::new("admin-1").unwrap()
    }

    async fn setup(user: Option<&str>) -> (UpdatePaymentStatusHandler, Arc<InMemoryMarketStore>, PaymentRecord) {
        let store = Arc::new(InMemoryMarketStore::new());
        store.add_admin(admin()).await;
        let app = AppListing {
            id: AppId::new(),
            name: "Pocket Ledger".to_string(),
            price: 50_000,
            currency: None,
            is_paid: true,
        };
        let record = PaymentRecord::create_pending(
            &app,
            BuyerDetails::parse("Rina", "rina@example.com", "bca_va").unwrap(),
            user.map(|u| UserId::new(u).unwrap()),
            24,
            Timestamp::now(),
        );
        store.insert_payment(record.clone()).await;
        let handler = UpdatePaymentStatusHandler::new(store.clone(), store.clone(), store.clone());
        (handler, store, record)
    }

    fn cmd(record: &PaymentRecord, status: &str) -> UpdatePaymentStatusCommand {
        UpdatePaymentStatusCommand {
            requester: admin(),
            payment_id: record.id.to_string(),
            status: status.to_string(),
            transaction_id: Some("manual-77".to_string()),
        }
    }

    #[tokio::test]
    async fn paid_label_verifies_and_grants() {
        let (handler, store, record) = setup(Some("user-1")).await;

        let result = handler.handle(cmd(&record, "paid")).await.unwrap();

        assert_eq!(result.payment.status, PaymentStatus::Verified);
        assert_eq!(result.payment.gateway_transaction_id.as_deref(), Some("manual-77"));
        assert_eq!(result.entitlement, EntitlementOutcome::Granted);
        assert_eq!(store.purchase_count().await, 1);
    }

    #[tokio::test]
    async fn refund_does_not_touch_entitlement() {
        let (handler, store, record) = setup(Some("user-1")).await;
        handler.handle(cmd(&record, "verified")).await.unwrap();

        let result = handler.handle(cmd(&record, "refunded")).await.unwrap();

        assert_eq!(result.payment.status, PaymentStatus::Refunded);
        assert_eq!(result.entitlement, EntitlementOutcome::Skipped);
        assert_eq!(store.purchase_count().await, 1);
    }

    #[tokio::test]
    async fn unknown_status_is_rejected() {
        let (handler, _store, record) = setup(None).await;
        let err = handler.handle(cmd(&record, "settled")).await.unwrap_err();
        assert!(matches!(err, PaymentError::Validation { ref field, .. } if field == "status"));
    }

    #[tokio::test]
    async fn unknown_payment_is_not_found() {
        let (handler, _store, record) = setup(None).await;
        let mut command = cmd(&record, "failed");
        command.payment_id = PaymentId::new().to_string();

        let err = handler.handle(command).await.unwrap_err();
        assert_eq!(err, PaymentError::not_found("Payment not found"));
    }

    #[tokio::test]
    async fn non_admin_is_forbidden_and_nothing_changes() {
        let (handler, store, record) = setup(Some("user-1")).await;
        let mut command = cmd(&record, "verified");
        command.requester = UserId::new("user-1").unwrap();

        let err = handler.handle(command).await.unwrap_err();

        assert!(matches!(err, PaymentError::Forbidden(_)));
        let stored = store.payment_by_order(&record.order_id).await.unwrap();
        assert_eq!(stored.status, PaymentStatus::Pending);
    }
}
