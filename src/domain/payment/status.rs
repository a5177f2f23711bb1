//! Payment status state machine.
//!
//! `verified` is the single success label. The legacy `paid` label still
//! found in older rows and admin tooling parses to `Verified`.

use crate::domain::foundation::{StateMachine, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Created, waiting for the buyer to finish checkout.
    Pending,

    /// Funds confirmed by the gateway. Grants the entitlement.
    #[serde(alias = "paid")]
    Verified,

    /// Denied, cancelled, or the checkout could not be created.
    Failed,

    /// Checkout window lapsed without payment.
    Expired,

    /// Money returned to the buyer after verification.
    Refunded,
}

impl PaymentStatus {
    /// All canonical statuses, in display order.
    pub const ALL: [PaymentStatus; 5] = [
        PaymentStatus::Pending,
        PaymentStatus::Verified,
        PaymentStatus::Failed,
        PaymentStatus::Expired,
        PaymentStatus::Refunded,
    ];

    /// Canonical storage and wire label.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Verified => "verified",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Expired => "expired",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, PaymentStatus::Verified)
    }
}

impl StateMachine for PaymentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, target),
            (Pending, Verified)
                | (Pending, Failed)
                | (Pending, Expired)
                // Late settlement after a denial or lapse
                | (Failed, Verified)
                | (Expired, Verified)
                | (Verified, Refunded)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use PaymentStatus::*;
        match self {
            Pending => vec![Verified, Failed, Expired],
            Failed => vec![Verified],
            Expired => vec![Verified],
            Verified => vec![Refunded],
            Refunded => vec![],
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "verified" | "paid" => Ok(PaymentStatus::Verified),
            "failed" => Ok(PaymentStatus::Failed),
            "expired" => Ok(PaymentStatus::Expired),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(ValidationError::invalid_format(
                "status",
                format!(
                    "'{}' is not one of pending, verified, failed, expired, refunded",
                    other
                ),
            )),
        }
    }
}
