//! Entitlement granting shared by the reconciler and the operator override.

use crate::domain::foundation::Timestamp;
use crate::domain::payment::{PaymentRecord, PurchaseRecord};
use crate::ports::{PurchaseRepository, SaveResult};

/// What happened to the buyer's entitlement after a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitlementOutcome {
    /// A purchase row was created.
    Granted,
    /// The user already owned the app; nothing written.
    AlreadyOwned,
    /// Payment not verified, or no user attached.
    Skipped,
    /// Storage refused the insert. Logged for manual follow-up.
    Failed,
}

/// Grants the entitlement a verified, attributed payment is owed.
///
/// Never fails the caller: the status change is already persisted and
/// a duplicate insert is treated as success.
pub(crate) async fn grant_entitlement(
    purchases: &dyn PurchaseRepository,
    record: &PaymentRecord,
) -> EntitlementOutcome {
    let Some(user_id) = record.entitled_user() else {
        return EntitlementOutcome::Skipped;
    };

    match purchases.find_by_user_and_app(user_id, &record.app_id).await {
        Ok(Some(_)) => return EntitlementOutcome::AlreadyOwned,
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(
                order_id = %record.order_id,
                error = %e,
                "Ownership pre-check failed, relying on insert constraint"
            );
        }
    }

    let purchase = PurchaseRecord::grant(user_id.clone(), record.app_id, record.id, Timestamp::now());
    match purchases.insert_if_absent(&purchase).await {
        Ok(SaveResult::Inserted) => {
            tracing::info!(
                order_id = %record.order_id,
                user_id = %user_id,
                app_id = %record.app_id,
                "Purchase entitlement granted"
            );
            EntitlementOutcome::Granted
        }
        Ok(SaveResult::AlreadyExists) => {
            tracing::debug!(order_id = %record.order_id, "Entitlement already present");
            EntitlementOutcome::AlreadyOwned
        }
        Err(e) => {
            tracing::error!(
                order_id = %record.order_id,
                payment_id = %record.id,
                user_id = %user_id,
                error = %e,
                "Failed to grant purchase entitlement"
            );
            EntitlementOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryMarketStore;
    use crate::domain::foundation::{AppId, UserId};
    use crate::domain::payment::{AppListing, BuyerDetails, PaymentStatus};

    fn record(user: Option<&str>, status: PaymentStatus) -> PaymentRecord {
        let app = AppListing {
            id: AppId::new(),
            name: "Pocket Ledger".to_string(),
            price: 50_000,
            currency: None,
            is_paid: true,
        };
        let mut record = PaymentRecord::create_pending(
            &app,
            BuyerDetails::parse("Rina", "rina@example.com", "gopay").unwrap(),
            user.map(|u| UserId::new(u).unwrap()),
            24,
            Timestamp::now(),
        );
        record.override_status(status, None, Timestamp::now());
        record
    }

    #[tokio::test]
    async fn verified_attributed_payment_is_granted_once() {
        let store = InMemoryMarketStore::new();
        let record = record(Some("user-1"), PaymentStatus::Verified);

        assert_eq!(grant_entitlement(&store, &record).await, EntitlementOutcome::Granted);
        assert_eq!(
            grant_entitlement(&store, &record).await,
            EntitlementOutcome::AlreadyOwned
        );
        assert_eq!(store.purchase_count().await, 1);
    }

    #[tokio::test]
    async fn anonymous_payment_is_skipped() {
        let store = InMemoryMarketStore::new();
        let record = record(None, PaymentStatus::Verified);

        assert_eq!(grant_entitlement(&store, &record).await, EntitlementOutcome::Skipped);
        assert_eq!(store.purchase_count().await, 0);
    }

    #[tokio::test]
    async fn unverified_payment_is_skipped() {
        let store = InMemoryMarketStore::new();
        for status in [PaymentStatus::Pending, PaymentStatus::Failed, PaymentStatus::Refunded] {
            let record = record(Some("user-1"), status);
            assert_eq!(grant_entitlement(&store, &record).await, EntitlementOutcome::Skipped);
        }
        assert_eq!(store.purchase_count().await, 0);
    }
}
