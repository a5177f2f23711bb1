//! Gateway payment notifications and their signature check.
//!
//! The gateway signs each notification with
//! `hex(sha512(order_id + status_code + gross_amount + server_key))`
//! and sends it as `signature_key` inside the JSON body.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

use super::gateway_status::map_raw_gateway_status;
use super::{OrderId, PaymentError, PaymentStatus};

/// A parsed and field-checked notification body.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayNotification {
    pub order_id: OrderId,
    pub status_code: String,
    pub gross_amount: String,
    pub signature_key: String,
    pub transaction_status: String,
    pub fraud_status: Option<String>,
    pub transaction_id: Option<String>,
    pub payment_type: Option<String>,
    /// The body exactly as received, kept for the audit trail.
    pub raw: Value,
}

#[derive(Debug, Deserialize)]
struct WireNotification {
    #[serde(default)]
    order_id: Option<Value>,
    #[serde(default)]
    status_code: Option<Value>,
    #[serde(default)]
    gross_amount: Option<Value>,
    #[serde(default)]
    signature_key: Option<String>,
    #[serde(default)]
    transaction_status: Option<String>,
    #[serde(default)]
    fraud_status: Option<String>,
    #[serde(default)]
    transaction_id: Option<String>,
    #[serde(default)]
    payment_type: Option<String>,
}

impl GatewayNotification {
    /// Parses a raw request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, PaymentError> {
        let raw: Value = serde_json::from_slice(body)
            .map_err(|e| PaymentError::validation("body", format!("Invalid JSON: {}", e)))?;
        Self::from_value(raw)
    }

    /// Parses an already-decoded JSON body.
    pub fn from_value(raw: Value) -> Result<Self, PaymentError> {
        let wire: WireNotification = serde_json::from_value(raw.clone())
            .map_err(|e| PaymentError::validation("body", format!("Invalid notification: {}", e)))?;

        Ok(Self {
            order_id: OrderId::new(require("order_id", signed_text("order_id", wire.order_id)?)?)?,
            status_code: require("status_code", signed_text("status_code", wire.status_code)?)?,
            gross_amount: require("gross_amount", signed_text("gross_amount", wire.gross_amount)?)?,
            signature_key: require("signature_key", wire.signature_key)?,
            transaction_status: require("transaction_status", wire.transaction_status)?,
            fraud_status: wire.fraud_status.filter(|s| !s.trim().is_empty()),
            transaction_id: wire.transaction_id,
            payment_type: wire.payment_type,
            raw,
        })
    }

    /// Internal status this notification implies, if any.
    pub fn mapped_status(&self) -> Option<PaymentStatus> {
        map_raw_gateway_status(&self.transaction_status, self.fraud_status.as_deref())
    }
}

fn require(field: &'static str, value: Option<String>) -> Result<String, PaymentError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(PaymentError::validation(
            field,
            format!("Missing required field: {}", field),
        )),
    }
}

/// Text of a field that takes part in the signature.
///
/// Integers are accepted because their decimal text is exact. Fractional
/// numbers are refused: `50000.00` decodes to a float and would print as
/// `50000.0`, which can never match what the gateway signed.
fn signed_text(field: &'static str, value: Option<Value>) -> Result<Option<String>, PaymentError> {
    match value {
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(Some(n.to_string())),
        Some(Value::Number(_)) => Err(PaymentError::validation(
            field,
            format!("{} must be sent as a string", field),
        )),
        _ => Ok(None),
    }
}

/// Checks notification signatures against the shared server key.
pub struct NotificationVerifier {
    server_key: SecretString,
}

impl NotificationVerifier {
    pub fn new(server_key: SecretString) -> Self {
        Self { server_key }
    }

    /// Lower-case hex digest the gateway is expected to send.
    pub fn expected_signature(&self, order_id: &str, status_code: &str, gross_amount: &str) -> String {
        hex::encode(self.digest(order_id, status_code, gross_amount))
    }

    /// Fails with `Authentication` unless the notification is signed with our key.
    pub fn verify(&self, notification: &GatewayNotification) -> Result<(), PaymentError> {
        let provided = hex::decode(notification.signature_key.trim())
            .map_err(|_| PaymentError::authentication("Invalid signature"))?;
        let expected = self.digest(
            notification.order_id.as_str(),
            &notification.status_code,
            &notification.gross_amount,
        );

        if !constant_time_compare(&expected, &provided) {
            return Err(PaymentError::authentication("Invalid signature"));
        }
        Ok(())
    }

    fn digest(&self, order_id: &str, status_code: &str, gross_amount: &str) -> Vec<u8> {
        let mut hasher = Sha512::new();
        hasher.update(order_id.as_bytes());
        hasher.update(status_code.as_bytes());
        hasher.update(gross_amount.as_bytes());
        hasher.update(self.server_key.expose_secret().as_bytes());
        hasher.finalize().to_vec()
    }
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
