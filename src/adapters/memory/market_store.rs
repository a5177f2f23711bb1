//! In-memory marketplace store.
//!
//! One `RwLock` guards apps, admins, payments and purchases, so every port
//! method sees a consistent snapshot. `insert_if_absent` checks and inserts
//! under the same write guard, which gives it the same effect as the
//! `(user_id, app_id)` unique constraint in PostgreSQL.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{AppId, DomainError, ErrorCode, PaymentId, UserId};
use crate::domain::payment::{
    AppListing, OrderId, OwnedApp, PaymentRecord, PaymentStatus, PurchaseRecord,
};
use crate::ports::{
    AdminDirectory, AppCatalog, PaymentPage, PaymentQuery, PaymentRepository, PurchaseRepository,
    SaveResult,
};

#[derive(Debug, Default)]
struct MarketState {
    apps: HashMap<AppId, AppListing>,
    admins: HashSet<UserId>,
    payments: HashMap<PaymentId, PaymentRecord>,
    purchases: Vec<PurchaseRecord>,
}

#[derive(Debug, Default)]
pub struct InMemoryMarketStore {
    state: RwLock<MarketState>,
}

impl InMemoryMarketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_app(&self, app: AppListing) {
        self.state.write().await.apps.insert(app.id, app);
    }

    pub async fn add_admin(&self, user_id: UserId) {
        self.state.write().await.admins.insert(user_id);
    }

    /// Stores a payment directly, replacing any record with the same id.
    pub async fn insert_payment(&self, record: PaymentRecord) {
        self.state.write().await.payments.insert(record.id, record);
    }

    pub async fn payment_by_order(&self, order_id: &OrderId) -> Option<PaymentRecord> {
        self.state
            .read()
            .await
            .payments
            .values()
            .find(|p| &p.order_id == order_id)
            .cloned()
    }

    pub async fn payment_count(&self) -> usize {
        self.state.read().await.payments.len()
    }

    pub async fn purchase_count(&self) -> usize {
        self.state.read().await.purchases.len()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryMarketStore {
    async fn insert(&self, record: &PaymentRecord) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        if state.payments.values().any(|p| p.order_id == record.order_id) {
            return Err(DomainError::database(format!(
                "duplicate order id {}",
                record.order_id
            )));
        }
        state.payments.insert(record.id, record.clone());
        Ok(())
    }

    async fn update(&self, record: &PaymentRecord) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        match state.payments.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::PaymentNotFound,
                format!("Payment {} not found", record.id),
            )),
        }
    }

    async fn update_if_status(
        &self,
        record: &PaymentRecord,
        expected: PaymentStatus,
    ) -> Result<bool, DomainError> {
        let mut state = self.state.write().await;
        match state.payments.get_mut(&record.id) {
            Some(existing) if existing.status == expected => {
                *existing = record.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<PaymentRecord>, DomainError> {
        Ok(self.state.read().await.payments.get(id).cloned())
    }

    async fn find_by_order_id(
        &self,
        order_id: &OrderId,
    ) -> Result<Option<PaymentRecord>, DomainError> {
        Ok(self.payment_by_order(order_id).await)
    }

    async fn list(&self, query: &PaymentQuery) -> Result<PaymentPage, DomainError> {
        let state = self.state.read().await;
        let mut matching: Vec<&PaymentRecord> = state
            .payments
            .values()
            .filter(|p| query.matches(p))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .cloned()
            .collect();

        Ok(PaymentPage { items, total })
    }
}

#[async_trait]
impl PurchaseRepository for InMemoryMarketStore {
    async fn insert_if_absent(&self, purchase: &PurchaseRecord) -> Result<SaveResult, DomainError> {
        let mut state = self.state.write().await;
        let exists = state
            .purchases
            .iter()
            .any(|p| p.user_id == purchase.user_id && p.app_id == purchase.app_id);
        if exists {
            return Ok(SaveResult::AlreadyExists);
        }
        state.purchases.push(purchase.clone());
        Ok(SaveResult::Inserted)
    }

    async fn find_by_user_and_app(
        &self,
        user_id: &UserId,
        app_id: &AppId,
    ) -> Result<Option<PurchaseRecord>, DomainError> {
        Ok(self
            .state
            .read()
            .await
            .purchases
            .iter()
            .find(|p| &p.user_id == user_id && &p.app_id == app_id)
            .cloned())
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<OwnedApp>, DomainError> {
        let state = self.state.read().await;
        let mut owned: Vec<OwnedApp> = state
            .purchases
            .iter()
            .filter(|p| &p.user_id == user_id)
            .map(|p| OwnedApp {
                purchase_id: p.id,
                app_id: p.app_id,
                app_name: state
                    .apps
                    .get(&p.app_id)
                    .map(|a| a.name.clone())
                    .unwrap_or_default(),
                payment_id: p.payment_id,
                purchased_at: p.purchased_at,
            })
            .collect();
        owned.sort_by(|a, b| b.purchased_at.cmp(&a.purchased_at));
        Ok(owned)
    }
}

#[async_trait]
impl AppCatalog for InMemoryMarketStore {
    async fn find_by_id(&self, id: &AppId) -> Result<Option<AppListing>, DomainError> {
        Ok(self.state.read().await.apps.get(id).cloned())
    }
}

#[async_trait]
impl AdminDirectory for InMemoryMarketStore {
    async fn is_admin(&self, user_id: &UserId) -> Result<bool, DomainError> {
        Ok(self.state.read().await.admins.contains(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;
    use crate::domain::payment::{BuyerDetails, PaymentStatus};
    use std::sync::Arc;

    fn app() -> AppListing {
        AppListing {
            id: AppId::new(),
            name: "Pocket Ledger".to_string(),
            price: 25_000,
            currency: None,
            is_paid: true,
        }
    }

    fn pending_at(app: &AppListing, email: &str, secs: u64) -> PaymentRecord {
        let buyer = BuyerDetails::parse("Rina", email, "gopay").unwrap();
        PaymentRecord::create_pending(
            app,
            buyer,
            None,
            24,
            Timestamp::from_unix_secs(secs).unwrap(),
        )
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Payments
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn insert_then_find_by_order() {
        let store = InMemoryMarketStore::new();
        let record = pending_at(&app(), "rina@example.com", 1_000);

        store.insert(&record).await.unwrap();

        let found = store.find_by_order_id(&record.order_id).await.unwrap().unwrap();
        assert_eq!(found.id, record.id);
        assert_eq!(store.payment_count().await, 1);
    }

    #[tokio::test]
    async fn update_of_unknown_payment_fails() {
        let store = InMemoryMarketStore::new();
        let record = pending_at(&app(), "rina@example.com", 1_000);

        let err = store.update(&record).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentNotFound);
    }

    #[tokio::test]
    async fn conditional_update_skips_moved_record() {
        let store = InMemoryMarketStore::new();
        let record = pending_at(&app(), "rina@example.com", 1_000);
        store.insert_payment(record.clone()).await;

        let mut verified = record.clone();
        verified.status = PaymentStatus::Verified;
        assert!(store
            .update_if_status(&verified, PaymentStatus::Pending)
            .await
            .unwrap());

        let mut failed = record.clone();
        failed.status = PaymentStatus::Failed;
        assert!(!store
            .update_if_status(&failed, PaymentStatus::Pending)
            .await
            .unwrap());

        let stored = store.payment_by_order(&record.order_id).await.unwrap();
        assert_eq!(stored.status, PaymentStatus::Verified);
    }

    #[tokio::test]
    async fn conditional_update_of_unknown_payment_is_false() {
        let store = InMemoryMarketStore::new();
        let record = pending_at(&app(), "rina@example.com", 1_000);

        assert!(!store
            .update_if_status(&record, PaymentStatus::Pending)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn list_filters_orders_and_pages() {
        let store = InMemoryMarketStore::new();
        let app = app();
        for (i, email) in ["a@x.io", "b@x.io", "c@y.io"].iter().enumerate() {
            store
                .insert_payment(pending_at(&app, email, 1_000 + i as u64))
                .await;
        }

        let page = store
            .list(&PaymentQuery {
                search: Some("X.IO".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].buyer_email, "b@x.io");

        let page = store
            .list(&PaymentQuery {
                limit: 1,
                offset: 1,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].buyer_email, "b@x.io");

        let page = store
            .list(&PaymentQuery {
                status: Some(PaymentStatus::Verified),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Purchases
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn second_grant_for_same_app_already_exists() {
        let store = InMemoryMarketStore::new();
        let user = UserId::new("user-1").unwrap();
        let app_id = AppId::new();

        let first = PurchaseRecord::grant(user.clone(), app_id, PaymentId::new(), Timestamp::now());
        let second = PurchaseRecord::grant(user.clone(), app_id, PaymentId::new(), Timestamp::now());

        assert_eq!(store.insert_if_absent(&first).await.unwrap(), SaveResult::Inserted);
        assert_eq!(
            store.insert_if_absent(&second).await.unwrap(),
            SaveResult::AlreadyExists
        );
        assert_eq!(store.purchase_count().await, 1);
    }

    #[tokio::test]
    async fn concurrent_grants_insert_once() {
        let store = Arc::new(InMemoryMarketStore::new());
        let user = UserId::new("user-1").unwrap();
        let app_id = AppId::new();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                let purchase =
                    PurchaseRecord::grant(user.clone(), app_id, PaymentId::new(), Timestamp::now());
                tokio::spawn(async move { store.insert_if_absent(&purchase).await.unwrap() })
            })
            .collect();

        let mut inserted = 0;
        for task in tasks {
            if task.await.unwrap() == SaveResult::Inserted {
                inserted += 1;
            }
        }

        assert_eq!(inserted, 1);
        assert_eq!(store.purchase_count().await, 1);
    }

    #[tokio::test]
    async fn admin_lookup() {
        let store = InMemoryMarketStore::new();
        let admin = UserId::new("admin-1").unwrap();
        store.add_admin(admin.clone()).await;

        assert!(store.is_admin(&admin).await.unwrap());
        assert!(!store.is_admin(&UserId::new("user-1").unwrap()).await.unwrap());
    }
}
