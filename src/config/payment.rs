//! Payment gateway configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use crate::domain::payment::DEFAULT_TOKEN_TTL_HOURS;

use super::error::ValidationError;

/// Payment channels offered on the hosted checkout page.
pub const DEFAULT_ENABLED_PAYMENTS: &[&str] = &[
    "credit_card",
    "gopay",
    "shopeepay",
    "other_qris",
    "bca_va",
    "bni_va",
    "bri_va",
    "permata_va",
    "other_va",
    "echannel",
    "alfamart",
    "indomaret",
];

/// Midtrans Snap settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Server key: authenticates Snap calls and signs notifications
    pub midtrans_server_key: SecretString,

    /// Client key handed to the storefront's Snap.js
    pub midtrans_client_key: Option<String>,

    /// Live gateway when true, sandbox otherwise
    #[serde(default)]
    pub is_production: bool,

    #[serde(default = "default_merchant_name")]
    pub merchant_name: String,

    /// Download token lifetime in hours
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,

    /// Comma-separated channel list; defaults to [`DEFAULT_ENABLED_PAYMENTS`]
    pub enabled_payments: Option<String>,

    /// Snap API call timeout in seconds
    #[serde(default = "default_gateway_timeout")]
    pub gateway_timeout_secs: u64,
}

impl PaymentConfig {
    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway_timeout_secs)
    }

    pub fn enabled_payments_list(&self) -> Vec<String> {
        match &self.enabled_payments {
            Some(list) => list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => DEFAULT_ENABLED_PAYMENTS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.midtrans_server_key.expose_secret().trim().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__MIDTRANS_SERVER_KEY"));
        }
        if !(1..=168).contains(&self.token_ttl_hours) {
            return Err(ValidationError::InvalidTokenTtl);
        }
        if self.enabled_payments_list().is_empty() {
            return Err(ValidationError::NoPaymentChannels);
        }
        Ok(())
    }
}

fn default_merchant_name() -> String {
    "Niconve".to_string()
}

fn default_token_ttl_hours() -> i64 {
    DEFAULT_TOKEN_TTL_HOURS
}

fn default_gateway_timeout() -> u64 {
    30
}
