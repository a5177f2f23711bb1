//! HandleNotificationHandler - reconciles gateway payment notifications.
//!
//! Order of work for every delivery:
//!
//! 1. Parse and authenticate. Bad signatures touch nothing.
//! 2. Resolve the payment by order id.
//! 3. Fold the gateway status into the record and persist it, always.
//! 4. If the payment is verified and attributed, grant the entitlement.
//!
//! Deliveries are at-least-once and may arrive concurrently. Step 3 writes
//! only over the status it read, so a slower delivery can never overwrite
//! a newer status. Step 4 is idempotent through the purchase uniqueness
//! constraint.

use std::sync::Arc;

use crate::domain::foundation::Timestamp;
use crate::domain::payment::{
    GatewayNotification, NotificationVerifier, OrderId, PaymentError, PaymentRecord,
    PaymentStatus, StatusChange,
};
use crate::ports::{PaymentRepository, PurchaseRepository};

use super::entitlement::{grant_entitlement, EntitlementOutcome};

/// Compare-and-set rounds before a delivery is answered with a retryable error.
const MAX_RECONCILE_ATTEMPTS: u32 = 5;

/// Command carrying the raw notification body.
#[derive(Debug, Clone)]
pub struct HandleNotificationCommand {
    pub payload: Vec<u8>,
}

/// Result of a reconciled notification.
#[derive(Debug, Clone)]
pub struct HandleNotificationResult {
    pub order_id: OrderId,
    /// Status after this notification.
    pub status: PaymentStatus,
    pub change: StatusChange,
    pub entitlement: EntitlementOutcome,
}

pub struct HandleNotificationHandler {
    payments: Arc<dyn PaymentRepository>,
    purchases: Arc<dyn PurchaseRepository>,
    verifier: Arc<NotificationVerifier>,
}

impl HandleNotificationHandler {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        purchases: Arc<dyn PurchaseRepository>,
        verifier: Arc<NotificationVerifier>,
    ) -> Self {
        Self {
            payments,
            purchases,
            verifier,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandleNotificationCommand,
    ) -> Result<HandleNotificationResult, PaymentError> {
        let notification = GatewayNotification::from_slice(&cmd.payload)?;

        if let Err(e) = self.verifier.verify(&notification) {
            tracing::warn!(
                order_id = %notification.order_id,
                "Rejected notification with invalid signature"
            );
            return Err(e);
        }

        let (record, change) = self.reconcile(&notification).await?;

        match change {
            StatusChange::Transitioned { from, to } => tracing::info!(
                order_id = %record.order_id,
                from = %from,
                to = %to,
                transaction_status = %notification.transaction_status,
                "Payment status changed"
            ),
            StatusChange::Rejected { current, attempted } => tracing::warn!(
                order_id = %record.order_id,
                current = %current,
                attempted = %attempted,
                transaction_status = %notification.transaction_status,
                "Ignoring status the payment cannot move to"
            ),
            StatusChange::Unchanged => tracing::debug!(
                order_id = %record.order_id,
                status = %record.status,
                transaction_status = %notification.transaction_status,
                "Notification recorded without status change"
            ),
        }

        let entitlement = grant_entitlement(self.purchases.as_ref(), &record).await;

        if matches!(change, StatusChange::Transitioned { to: PaymentStatus::Verified, .. }) {
            tracing::info!(
                order_id = %record.order_id,
                buyer_email = %record.buyer_email,
                "Payment verified, buyer confirmation email due"
            );
        }

        Ok(HandleNotificationResult {
            order_id: record.order_id,
            status: record.status,
            change,
            entitlement,
        })
    }

    /// Folds the notification into the stored record and writes it back
    /// only if no other delivery moved the status in between. A lost race
    /// re-reads and folds again against the newer state.
    async fn reconcile(
        &self,
        notification: &GatewayNotification,
    ) -> Result<(PaymentRecord, StatusChange), PaymentError> {
        for attempt in 1..=MAX_RECONCILE_ATTEMPTS {
            let mut record = self
                .payments
                .find_by_order_id(&notification.order_id)
                .await?
                .ok_or_else(|| {
                    tracing::warn!(order_id = %notification.order_id, "Notification for unknown order");
                    PaymentError::not_found("Payment not found")
                })?;

            let expected = record.status;
            let change = record.apply_notification(notification, Timestamp::now());

            // Never grant against a status that did not reach storage.
            let written = self
                .payments
                .update_if_status(&record, expected)
                .await
                .map_err(|e| {
                    tracing::error!(
                        order_id = %record.order_id,
                        error = %e,
                        "Failed to persist notification"
                    );
                    PaymentError::persistence(e.to_string())
                })?;
            if written {
                return Ok((record, change));
            }

            tracing::debug!(
                order_id = %record.order_id,
                attempt,
                "Payment changed by a concurrent delivery, re-reading"
            );
        }

        tracing::error!(
            order_id = %notification.order_id,
            "Gave up reconciling notification under contention"
        );
        Err(PaymentError::persistence(format!(
            "payment {} kept changing concurrently",
            notification.order_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryMarketStore;
    use crate::domain::foundation::{AppId, DomainError, PaymentId, UserId};
    use crate::domain::payment::{AppListing, BuyerDetails, PaymentRecord};
    use crate::ports::{PaymentPage, PaymentQuery};
    use async_trait::async_trait;
    use secrecy::SecretString;
    use serde_json::json;

    const SERVER_KEY: &str = "SB-Mid-server-unit";

    // ════════════════════════════════════════════════════════════════════════════
    // Fixtures
    // ════════════════════════════════════════════════════════════════════════════

    fn verifier() -> Arc<NotificationVerifier> {
        Arc::new(NotificationVerifier::new(SecretString::new(SERVER_KEY.to_string())))
    }

    fn pending(user: Option<&str>) -> PaymentRecord {
        let app = AppListing {
            id: AppId::new(),
            name: "Pocket Ledger".to_string(),
            price: 50_000,
            currency: None,
            is_paid: true,
        };
        PaymentRecord::create_pending(
            &app,
            BuyerDetails::parse("Rina", "rina@example.com", "gopay").unwrap(),
            user.map(|u| UserId::new(u).unwrap()),
            24,
            Timestamp::now(),
        )
    }

    fn payload(order_id: &str, status: &str, fraud: Option<&str>) -> Vec<u8> {
        let signature = verifier().expected_signature(order_id, "200", "50000.00");
        serde_json::to_vec(&json!({
            "order_id": order_id,
            "status_code": "200",
            "gross_amount": "50000.00",
            "signature_key": signature,
            "transaction_status": status,
            "fraud_status": fraud,
        }))
        .unwrap()
    }

    async fn setup(record: &PaymentRecord) -> (HandleNotificationHandler, Arc<InMemoryMarketStore>) {
        let store = Arc::new(InMemoryMarketStore::new());
        store.insert_payment(record.clone()).await;
        let handler = HandleNotificationHandler::new(store.clone(), store.clone(), verifier());
        (handler, store)
    }

    fn cmd(payload: Vec<u8>) -> HandleNotificationCommand {
        HandleNotificationCommand { payload }
    }

    /// Finds records but fails every update.
    struct UpdateFails(PaymentRecord);

    #[async_trait]
    impl PaymentRepository for UpdateFails {
        async fn insert(&self, _record: &PaymentRecord) -> Result<(), DomainError> {
            Ok(())
        }
        async fn update(&self, _record: &PaymentRecord) -> Result<(), DomainError> {
            Err(DomainError::database("deadlock detected"))
        }
        async fn update_if_status(
            &self,
            _record: &PaymentRecord,
            _expected: PaymentStatus,
        ) -> Result<bool, DomainError> {
            Err(DomainError::database("deadlock detected"))
        }
        async fn find_by_id(&self, _id: &PaymentId) -> Result<Option<PaymentRecord>, DomainError> {
            Ok(Some(self.0.clone()))
        }
        async fn find_by_order_id(
            &self,
            _order_id: &OrderId,
        ) -> Result<Option<PaymentRecord>, DomainError> {
            Ok(Some(self.0.clone()))
        }
        async fn list(&self, _query: &PaymentQuery) -> Result<PaymentPage, DomainError> {
            Ok(PaymentPage {
                items: vec![],
                total: 0,
            })
        }
    }

    /// Holds the first two reads until both have loaded the record, and
    /// slows down writes of `failed` so they land after the settlement.
    struct InterleavedReads {
        inner: Arc<InMemoryMarketStore>,
        gate: tokio::sync::Barrier,
        reads: std::sync::atomic::AtomicUsize,
    }

    impl InterleavedReads {
        fn new(inner: Arc<InMemoryMarketStore>) -> Self {
            Self {
                inner,
                gate: tokio::sync::Barrier::new(2),
                reads: std::sync::atomic::AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PaymentRepository for InterleavedReads {
        async fn insert(&self, record: &PaymentRecord) -> Result<(), DomainError> {
            self.inner.insert(record).await
        }
        async fn update(&self, record: &PaymentRecord) -> Result<(), DomainError> {
            self.inner.update(record).await
        }
        async fn update_if_status(
            &self,
            record: &PaymentRecord,
            expected: PaymentStatus,
        ) -> Result<bool, DomainError> {
            if record.status == PaymentStatus::Failed {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }
            self.inner.update_if_status(record, expected).await
        }
        async fn find_by_id(&self, id: &PaymentId) -> Result<Option<PaymentRecord>, DomainError> {
            PaymentRepository::find_by_id(self.inner.as_ref(), id).await
        }
        async fn find_by_order_id(
            &self,
            order_id: &OrderId,
        ) -> Result<Option<PaymentRecord>, DomainError> {
            let found = self.inner.find_by_order_id(order_id).await;
            let n = self.reads.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if n < 2 {
                self.gate.wait().await;
            }
            found
        }
        async fn list(&self, query: &PaymentQuery) -> Result<PaymentPage, DomainError> {
            self.inner.list(query).await
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Status mapping
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn settlement_verifies_and_grants() {
        let record = pending(Some("user-1"));
        let (handler, store) = setup(&record).await;

        let result = handler
            .handle(cmd(payload(record.order_id.as_str(), "settlement", None)))
            .await
            .unwrap();

        assert_eq!(result.status, PaymentStatus::Verified);
        assert_eq!(result.entitlement, EntitlementOutcome::Granted);
        let stored = store.payment_by_order(&record.order_id).await.unwrap();
        assert_eq!(stored.status, PaymentStatus::Verified);
        assert!(stored.verified_at.is_some());
        assert_eq!(store.purchase_count().await, 1);
    }

    #[tokio::test]
    async fn capture_accept_verifies() {
        let record = pending(Some("user-1"));
        let (handler, _store) = setup(&record).await;

        let result = handler
            .handle(cmd(payload(record.order_id.as_str(), "capture", Some("accept"))))
            .await
            .unwrap();

        assert_eq!(result.status, PaymentStatus::Verified);
    }

    #[tokio::test]
    async fn capture_challenge_stays_pending_but_is_recorded() {
        let record = pending(Some("user-1"));
        let (handler, store) = setup(&record).await;

        let result = handler
            .handle(cmd(payload(record.order_id.as_str(), "capture", Some("challenge"))))
            .await
            .unwrap();

        assert_eq!(result.status, PaymentStatus::Pending);
        assert_eq!(result.entitlement, EntitlementOutcome::Skipped);
        let stored = store.payment_by_order(&record.order_id).await.unwrap();
        assert_eq!(stored.gateway_fraud_status.as_deref(), Some("challenge"));
        assert!(stored.gateway_response.is_some());
    }

    #[tokio::test]
    async fn deny_fails_without_entitlement() {
        let record = pending(Some("user-1"));
        let (handler, store) = setup(&record).await;

        let result = handler
            .handle(cmd(payload(record.order_id.as_str(), "deny", None)))
            .await
            .unwrap();

        assert_eq!(result.status, PaymentStatus::Failed);
        assert_eq!(store.purchase_count().await, 0);
    }

    #[tokio::test]
    async fn verified_anonymous_payment_skips_entitlement() {
        let record = pending(None);
        let (handler, store) = setup(&record).await;

        let result = handler
            .handle(cmd(payload(record.order_id.as_str(), "settlement", None)))
            .await
            .unwrap();

        assert_eq!(result.status, PaymentStatus::Verified);
        assert_eq!(result.entitlement, EntitlementOutcome::Skipped);
        assert_eq!(store.purchase_count().await, 0);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Idempotence
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn replay_yields_one_purchase() {
        let record = pending(Some("user-1"));
        let (handler, store) = setup(&record).await;
        let body = payload(record.order_id.as_str(), "settlement", None);

        handler.handle(cmd(body.clone())).await.unwrap();
        let second = handler.handle(cmd(body)).await.unwrap();

        assert_eq!(second.status, PaymentStatus::Verified);
        assert_eq!(second.change, StatusChange::Unchanged);
        assert_eq!(second.entitlement, EntitlementOutcome::AlreadyOwned);
        assert_eq!(store.purchase_count().await, 1);
    }

    #[tokio::test]
    async fn later_deny_does_not_unverify() {
        let record = pending(Some("user-1"));
        let (handler, store) = setup(&record).await;

        handler
            .handle(cmd(payload(record.order_id.as_str(), "settlement", None)))
            .await
            .unwrap();
        let result = handler
            .handle(cmd(payload(record.order_id.as_str(), "expire", None)))
            .await
            .unwrap();

        assert_eq!(result.status, PaymentStatus::Verified);
        assert_eq!(store.purchase_count().await, 1);
    }

    #[tokio::test]
    async fn concurrent_duplicates_grant_once() {
        let record = pending(Some("user-1"));
        let (handler, store) = setup(&record).await;
        let handler = Arc::new(handler);
        let body = payload(record.order_id.as_str(), "settlement", None);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let handler = handler.clone();
                let body = body.clone();
                tokio::spawn(async move { handler.handle(cmd(body)).await })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }

        assert_eq!(store.purchase_count().await, 1);
    }

    #[tokio::test]
    async fn racing_settlement_and_deny_stay_verified() {
        let record = pending(Some("user-1"));
        let store = Arc::new(InMemoryMarketStore::new());
        store.insert_payment(record.clone()).await;
        let handler = HandleNotificationHandler::new(
            Arc::new(InterleavedReads::new(store.clone())),
            store.clone(),
            verifier(),
        );

        let (settled, denied) = tokio::join!(
            handler.handle(cmd(payload(record.order_id.as_str(), "settlement", None))),
            handler.handle(cmd(payload(record.order_id.as_str(), "deny", None))),
        );

        assert_eq!(settled.unwrap().status, PaymentStatus::Verified);
        let denied = denied.unwrap();
        assert_eq!(denied.status, PaymentStatus::Verified);
        assert_ne!(
            denied.change,
            StatusChange::Transitioned {
                from: PaymentStatus::Pending,
                to: PaymentStatus::Failed,
            }
        );

        let stored = store.payment_by_order(&record.order_id).await.unwrap();
        assert_eq!(stored.status, PaymentStatus::Verified);
        assert!(stored.verified_at.is_some());
        assert_eq!(stored.gateway_transaction_status.as_deref(), Some("deny"));
        assert_eq!(store.purchase_count().await, 1);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Rejections
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn bad_signature_changes_nothing() {
        let record = pending(Some("user-1"));
        let (handler, store) = setup(&record).await;
        let mut body: serde_json::Value =
            serde_json::from_slice(&payload(record.order_id.as_str(), "settlement", None)).unwrap();
        body["signature_key"] = json!("00".repeat(64));

        let err = handler
            .handle(cmd(serde_json::to_vec(&body).unwrap()))
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::Authentication(_)));
        let stored = store.payment_by_order(&record.order_id).await.unwrap();
        assert_eq!(stored, record);
        assert_eq!(store.purchase_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let record = pending(Some("user-1"));
        let (handler, store) = setup(&record).await;

        let err = handler
            .handle(cmd(payload("ORDER-0-NOPE", "settlement", None)))
            .await
            .unwrap_err();

        assert_eq!(err, PaymentError::not_found("Payment not found"));
        assert_eq!(store.purchase_count().await, 0);
    }

    #[tokio::test]
    async fn missing_field_is_validation_error() {
        let record = pending(None);
        let (handler, _store) = setup(&record).await;

        let err = handler
            .handle(cmd(br#"{"order_id":"ORDER-1-A","status_code":"200"}"#.to_vec()))
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::Validation { .. }));
    }

    #[tokio::test]
    async fn persistence_failure_aborts_before_entitlement() {
        let record = pending(Some("user-1"));
        let store = Arc::new(InMemoryMarketStore::new());
        let handler = HandleNotificationHandler::new(
            Arc::new(UpdateFails(record.clone())),
            store.clone(),
            verifier(),
        );

        let err = handler
            .handle(cmd(payload(record.order_id.as_str(), "settlement", None)))
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::Persistence(_)));
        assert_eq!(store.purchase_count().await, 0);
    }
}
