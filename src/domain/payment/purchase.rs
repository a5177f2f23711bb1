//! PurchaseRecord - a durable entitlement to one app for one user.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AppId, PaymentId, PurchaseId, Timestamp, UserId};

/// At most one exists per `(user_id, app_id)`; storage enforces this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub id: PurchaseId,
    pub user_id: UserId,
    pub app_id: AppId,
    pub payment_id: PaymentId,
    pub purchased_at: Timestamp,
}

impl PurchaseRecord {
    pub fn grant(user_id: UserId, app_id: AppId, payment_id: PaymentId, now: Timestamp) -> Self {
        Self {
            id: PurchaseId::new(),
            user_id,
            app_id,
            payment_id,
            purchased_at: now,
        }
    }
}

/// A purchase joined with the app it unlocks, for listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedApp {
    pub purchase_id: PurchaseId,
    pub app_id: AppId,
    pub app_name: String,
    pub payment_id: PaymentId,
    pub purchased_at: Timestamp,
}
