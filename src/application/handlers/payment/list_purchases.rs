//! ListPurchasesHandler - apps the signed-in buyer owns.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::payment::{OwnedApp, PaymentError};
use crate::ports::PurchaseRepository;

#[derive(Debug, Clone)]
pub struct ListPurchasesQuery {
    pub user_id: UserId,
}

#[derive(Debug, Clone)]
pub struct ListPurchasesResult {
    pub purchases: Vec<OwnedApp>,
}

pub struct ListPurchasesHandler {
    purchases: Arc<dyn PurchaseRepository>,
}

impl ListPurchasesHandler {
    pub fn new(purchases: Arc<dyn PurchaseRepository>) -> Self {
        Self { purchases }
    }

    pub async fn handle(&self, query: ListPurchasesQuery) -> Result<ListPurchasesResult, PaymentError> {
        let purchases = self.purchases.list_for_user(&query.user_id).await?;
        Ok(ListPurchasesResult { purchases })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryMarketStore;
    use crate::domain::foundation::{AppId, PaymentId, Timestamp};
    use crate::domain::payment::{AppListing, PurchaseRecord};

    #[tokio::test]
    async fn lists_owned_apps_newest_first() {
        let store = Arc::new(InMemoryMarketStore::new());
        let user = UserId::new("user-1").unwrap();
        for (name, secs) in [("Pocket Ledger", 1_000), ("Trail Maps", 2_000)] {
            let app = AppListing {
                id: AppId::new(),
                name: name.to_string(),
                price: 10_000,
                currency: None,
                is_paid: true,
            };
            store.add_app(app.clone()).await;
            store
                .insert_if_absent(&PurchaseRecord::grant(
                    user.clone(),
                    app.id,
                    PaymentId::new(),
                    Timestamp::from_unix_secs(secs).unwrap(),
                ))
                .await
                .unwrap();
        }
        let handler = ListPurchasesHandler::new(store);

        let result = handler.handle(ListPurchasesQuery { user_id: user }).await.unwrap();

        let names: Vec<&str> = result.purchases.iter().map(|p| p.app_name.as_str()).collect();
        assert_eq!(names, vec!["Trail Maps", "Pocket Ledger"]);
    }

    #[tokio::test]
    async fn buyer_without_purchases_gets_empty_list() {
        let handler = ListPurchasesHandler::new(Arc::new(InMemoryMarketStore::new()));
        let result = handler
            .handle(ListPurchasesQuery {
                user_id: UserId::new("user-9").unwrap(),
            })
            .await
            .unwrap();
        assert!(result.purchases.is_empty());
    }
}
