//! Rate limiting port.
//!
//! Fixed-window counters keyed by scope, identifier and an optional
//! resource name. In-memory and Redis adapters implement it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::Timestamp;

/// Port for rate limiting operations.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Count one request against `key` and report whether it may proceed.
    async fn check(&self, key: RateLimitKey) -> Result<RateLimitResult, RateLimitError>;

    /// Current quota without counting a request.
    async fn status(&self, key: RateLimitKey) -> Result<RateLimitStatus, RateLimitError>;

    /// Clear the current window for `key`.
    async fn reset(&self, key: RateLimitKey) -> Result<(), RateLimitError>;
}

/// Key identifying what to rate limit.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct RateLimitKey {
    pub scope: RateLimitScope,
    /// Identifier within the scope (an IP address, or `global`).
    pub identifier: String,
    /// Optional resource for per-endpoint limits (e.g. `create_payment`).
    pub resource: Option<String>,
}

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitScope {
    Global,
    Ip,
}

impl RateLimitKey {
    pub fn global() -> Self {
        Self {
            scope: RateLimitScope::Global,
            identifier: "global".to_string(),
            resource: None,
        }
    }

    pub fn ip(ip: &str) -> Self {
        Self {
            scope: RateLimitScope::Ip,
            identifier: ip.to_string(),
            resource: None,
        }
    }

    /// Narrows the key to one resource.
    pub fn for_resource(mut self, resource: &str) -> Self {
        self.resource = Some(resource.to_string());
        self
    }

    /// Returns the Redis key string for this rate limit key.
    pub fn to_redis_key(&self) -> String {
        match &self.resource {
            Some(resource) => format!(
                "ratelimit:{}:{}:{}",
                self.scope.as_str(),
                self.identifier,
                resource
            ),
            None => format!("ratelimit:{}:{}", self.scope.as_str(), self.identifier),
        }
    }
}

impl RateLimitScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitScope::Global => "global",
            RateLimitScope::Ip => "ip",
        }
    }
}

impl fmt::Display for RateLimitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    Allowed(RateLimitStatus),
    Denied(RateLimitDenied),
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed(_))
    }
}

/// Current rate limit status.
#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    /// Maximum requests allowed in the window.
    pub limit: u32,
    /// Remaining requests in the current window.
    pub remaining: u32,
    /// When the current window resets.
    pub reset_at: Timestamp,
    pub window_secs: u32,
}

/// Details of a rate limit denial.
#[derive(Debug, Clone)]
pub struct RateLimitDenied {
    pub limit: u32,
    /// Seconds until the client should retry.
    pub retry_after_secs: u32,
    /// The scope that triggered the denial.
    pub scope: RateLimitScope,
    pub message: String,
}

/// Errors that can occur during rate limiting operations.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    /// Rate limiter backend is unavailable.
    #[error("rate limiter unavailable: {0}")]
    Unavailable(String),

    /// Invalid rate limit key provided.
    #[error("invalid key: {0}")]
    InvalidKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ip_key_has_no_resource_by_default() {
        let key = RateLimitKey::ip("192.168.1.1");
        assert_eq!(key.scope, RateLimitScope::Ip);
        assert_eq!(key.identifier, "192.168.1.1");
        assert!(key.resource.is_none());
    }

    #[test]
    fn for_resource_narrows_key() {
        let key = RateLimitKey::ip("10.0.0.1").for_resource("create_payment");
        assert_eq!(key.resource.as_deref(), Some("create_payment"));
        assert_ne!(key, RateLimitKey::ip("10.0.0.1"));
    }

    #[test]
    fn redis_key_format() {
        assert_eq!(RateLimitKey::ip("10.0.0.1").to_redis_key(), "ratelimit:ip:10.0.0.1");
        assert_eq!(
            RateLimitKey::ip("10.0.0.1")
                .for_resource("create_payment")
                .to_redis_key(),
            "ratelimit:ip:10.0.0.1:create_payment"
        );
        assert_eq!(RateLimitKey::global().to_redis_key(), "ratelimit:global:global");
    }

    #[test]
    fn result_reports_allowed() {
        let allowed = RateLimitResult::Allowed(RateLimitStatus {
            limit: 5,
            remaining: 4,
            reset_at: Timestamp::now(),
            window_secs: 60,
        });
        assert!(allowed.is_allowed());

        let denied = RateLimitResult::Denied(RateLimitDenied {
            limit: 5,
            retry_after_secs: 30,
            scope: RateLimitScope::Ip,
            message: "Too many payment attempts".to_string(),
        });
        assert!(!denied.is_allowed());
    }
}
