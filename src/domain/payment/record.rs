//! PaymentRecord aggregate.
//!
//! One record per checkout attempt. Purchase terms are captured once at
//! creation; afterwards only the status and gateway bookkeeping change.
//!
//! # Invariants
//!
//! - `order_id`, terms, and `download_token` never change after creation
//! - Gateway notifications move the status only along `PaymentStatus`
//!   state machine edges; anything else is recorded but not applied
//! - `verified_at` is stamped on the first transition into `Verified`

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{AppId, PaymentId, StateMachine, Timestamp, UserId};

use super::{
    AppListing, BuyerDetails, DownloadToken, GatewayNotification, OrderId, PaymentError,
    PaymentStatus,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub app_id: AppId,
    /// Present only when the buyer was signed in at purchase time.
    pub user_id: Option<UserId>,
    pub buyer_name: String,
    pub buyer_email: String,
    pub amount: i64,
    pub currency: String,
    pub payment_method: String,
    pub status: PaymentStatus,
    pub download_token: DownloadToken,
    pub token_expires_at: Timestamp,

    pub checkout_token: Option<String>,
    pub checkout_url: Option<String>,
    pub gateway_transaction_id: Option<String>,
    pub gateway_transaction_status: Option<String>,
    pub gateway_fraud_status: Option<String>,
    /// Last raw payload exchanged with the gateway.
    pub gateway_response: Option<Value>,
    pub error_message: Option<String>,

    pub verified_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// What a gateway notification did to the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// Status moved along a legal edge.
    Transitioned {
        from: PaymentStatus,
        to: PaymentStatus,
    },
    /// The notification implied the status the record already had,
    /// or implied nothing at all.
    Unchanged,
    /// The implied status is not reachable from the current one.
    Rejected {
        current: PaymentStatus,
        attempted: PaymentStatus,
    },
}

impl PaymentRecord {
    /// Starts a new checkout attempt in `Pending`.
    pub fn create_pending(
        app: &AppListing,
        buyer: BuyerDetails,
        user_id: Option<UserId>,
        token_ttl_hours: i64,
        now: Timestamp,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            order_id: OrderId::generate(now),
            app_id: app.id,
            user_id,
            buyer_name: buyer.name,
            buyer_email: buyer.email,
            amount: app.price,
            currency: app.currency_or_default(),
            payment_method: buyer.payment_method,
            status: PaymentStatus::Pending,
            download_token: DownloadToken::generate(now),
            token_expires_at: now.plus_hours(token_ttl_hours),
            checkout_token: None,
            checkout_url: None,
            gateway_transaction_id: None,
            gateway_transaction_status: None,
            gateway_fraud_status: None,
            gateway_response: None,
            error_message: None,
            verified_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Stores the hosted-checkout handle returned by the gateway.
    pub fn record_checkout(&mut self, token: String, redirect_url: String, raw: Value) {
        self.checkout_token = Some(token);
        self.checkout_url = Some(redirect_url);
        self.gateway_response = Some(raw);
        self.updated_at = Timestamp::now();
    }

    /// Marks a checkout that the gateway refused to create.
    pub fn mark_checkout_failed(&mut self, message: impl Into<String>) -> Result<(), PaymentError> {
        self.status = self
            .status
            .transition_to(PaymentStatus::Failed)
            .map_err(|e| PaymentError::invalid_state(e.to_string()))?;
        self.error_message = Some(message.into());
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Folds a verified gateway notification into the record.
    ///
    /// Raw gateway fields are always overwritten; the status only moves
    /// when the state machine allows it.
    pub fn apply_notification(
        &mut self,
        notification: &GatewayNotification,
        now: Timestamp,
    ) -> StatusChange {
        self.gateway_transaction_status = Some(notification.transaction_status.clone());
        self.gateway_fraud_status = notification.fraud_status.clone();
        if notification.transaction_id.is_some() {
            self.gateway_transaction_id = notification.transaction_id.clone();
        }
        self.gateway_response = Some(notification.raw.clone());
        self.updated_at = now;

        let change = match notification.mapped_status() {
            None => StatusChange::Unchanged,
            Some(target) if target == self.status => StatusChange::Unchanged,
            Some(target) if self.status.can_transition_to(&target) => StatusChange::Transitioned {
                from: self.status,
                to: target,
            },
            Some(target) => StatusChange::Rejected {
                current: self.status,
                attempted: target,
            },
        };

        if let StatusChange::Transitioned { to, .. } = change {
            self.set_status(to, now);
        }
        change
    }

    /// Operator override. Any canonical status may be set.
    pub fn override_status(
        &mut self,
        target: PaymentStatus,
        transaction_id: Option<String>,
        now: Timestamp,
    ) -> StatusChange {
        if let Some(id) = transaction_id.filter(|id| !id.trim().is_empty()) {
            self.gateway_transaction_id = Some(id);
        }
        self.updated_at = now;

        if target == self.status {
            return StatusChange::Unchanged;
        }
        let from = self.status;
        self.set_status(target, now);
        StatusChange::Transitioned { from, to: target }
    }

    /// The user owed an entitlement, if the payment is verified and attributed.
    pub fn entitled_user(&self) -> Option<&UserId> {
        if self.status.is_verified() {
            self.user_id.as_ref()
        } else {
            None
        }
    }

    fn set_status(&mut self, to: PaymentStatus, now: Timestamp) {
        self.status = to;
        if to.is_verified() && self.verified_at.is_none() {
            self.verified_at = Some(now);
        }
    }
}
