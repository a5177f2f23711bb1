//! CheckOwnershipHandler - does the caller own an app?
//!
//! Anonymous callers get a negative answer rather than an error so the
//! storefront can render buy buttons without signing in.

use std::sync::Arc;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::payment::{parse_app_id, PaymentError};
use crate::ports::PurchaseRepository;

#[derive(Debug, Clone)]
pub struct CheckOwnershipQuery {
    pub user_id: Option<UserId>,
    pub app_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOwnershipResult {
    pub owns_app: bool,
    pub authenticated: bool,
    pub purchase_date: Option<Timestamp>,
}

pub struct CheckOwnershipHandler {
    purchases: Arc<dyn PurchaseRepository>,
}

impl CheckOwnershipHandler {
    pub fn new(purchases: Arc<dyn PurchaseRepository>) -> Self {
        Self { purchases }
    }

    pub async fn handle(&self, query: CheckOwnershipQuery) -> Result<CheckOwnershipResult, PaymentError> {
        let app_id = parse_app_id(&query.app_id)?;

        let Some(user_id) = query.user_id else {
            return Ok(CheckOwnershipResult {
                owns_app: false,
                authenticated: false,
                purchase_date: None,
            });
        };

        let purchase = self.purchases.find_by_user_and_app(&user_id, &app_id).await?;
        Ok(CheckOwnershipResult {
            owns_app: purchase.is_some(),
            authenticated: true,
            purchase_date: purchase.map(|p| p.purchased_at),
        })
    }
}
