//! Rate limit configuration types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ports::{RateLimitKey, RateLimitScope};

/// Resource name guarding payment creation.
pub const CREATE_PAYMENT_RESOURCE: &str = "create_payment";

/// Complete rate limit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Global rate limits (infrastructure protection).
    pub global: GlobalLimits,
    /// Per-IP rate limits.
    pub per_ip: IpLimits,
    /// Per-resource windows, applied to any scope that names the resource.
    pub resources: HashMap<String, ResourceLimits>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalLimits {
    pub requests_per_minute: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpLimits {
    pub requests_per_minute: u32,
}

/// Rate limits for a specific resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Maximum requests per window.
    pub requests_per_window: u32,
    /// Window duration in seconds.
    pub window_secs: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        let mut resources = HashMap::new();
        resources.insert(
            CREATE_PAYMENT_RESOURCE.to_string(),
            ResourceLimits {
                requests_per_window: 5,
                window_secs: 60,
            },
        );

        Self {
            global: GlobalLimits {
                requests_per_minute: 10_000,
            },
            per_ip: IpLimits {
                requests_per_minute: 100,
            },
            resources,
        }
    }
}

impl RateLimitConfig {
    /// Returns `(limit, window_secs)` for a key.
    ///
    /// A configured resource wins over the scope default.
    pub fn limits_for(&self, key: &RateLimitKey) -> (u32, u32) {
        if let Some(limits) = key
            .resource
            .as_deref()
            .and_then(|resource| self.resources.get(resource))
        {
            return (limits.requests_per_window, limits.window_secs);
        }

        match key.scope {
            RateLimitScope::Global => (self.global.requests_per_minute, 60),
            RateLimitScope::Ip => (self.per_ip.requests_per_minute, 60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_creation_defaults_to_five_per_minute() {
        let config = RateLimitConfig::default();
        let key = RateLimitKey::ip("10.0.0.1").for_resource(CREATE_PAYMENT_RESOURCE);
        assert_eq!(config.limits_for(&key), (5, 60));
    }

    #[test]
    fn unknown_resource_falls_back_to_scope() {
        let config = RateLimitConfig::default();
        let key = RateLimitKey::ip("10.0.0.1").for_resource("unknown");
        assert_eq!(config.limits_for(&key), (100, 60));
        assert_eq!(config.limits_for(&RateLimitKey::global()), (10_000, 60));
    }

    #[test]
    fn serializes_to_json() {
        let json = serde_json::to_string(&RateLimitConfig::default()).unwrap();
        assert!(json.contains("\"create_payment\":{\"requests_per_window\":5,\"window_secs\":60}"));
    }
}
