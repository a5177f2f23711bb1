//! Order identifiers and download capability tokens.
//!
//! Both embed the creation time in milliseconds followed by random
//! material taken from a v4 UUID.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::foundation::{Timestamp, ValidationError};

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ORDER_SUFFIX_LEN: usize = 9;

/// Hours a download token stays valid after the order is created.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Public order identifier shared with the gateway, e.g. `ORDER-1718000000000-K3J9X0Q2Z`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Mints a fresh order id for the given instant.
    pub fn generate(now: Timestamp) -> Self {
        Self(format!(
            "ORDER-{}-{}",
            now.as_unix_millis(),
            base36_suffix(Uuid::new_v4(), ORDER_SUFFIX_LEN)
        ))
    }

    /// Wraps an order id received from outside (gateway, storage).
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("order_id"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bearer capability for downloading a purchased build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DownloadToken(String);

impl DownloadToken {
    /// Mints a token with 128 bits of randomness, e.g. `DL-1718000000000-9F2C...`.
    pub fn generate(now: Timestamp) -> Self {
        Self(format!(
            "DL-{}-{}",
            now.as_unix_millis(),
            Uuid::new_v4().simple().to_string().to_ascii_uppercase()
        ))
    }

    /// Rehydrates a stored token.
    pub fn from_stored(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn base36_suffix(uuid: Uuid, len: usize) -> String {
    let mut n = uuid.as_u128();
    let mut out = String::with_capacity(len);
    for _ in 0..len {
        out.push(BASE36[(n % 36) as usize] as char);
        n /= 36;
    }
    out
}
