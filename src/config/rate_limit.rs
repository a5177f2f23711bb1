//! Rate limit configuration

use serde::Deserialize;

use crate::adapters::rate_limiter::{
    GlobalLimits, IpLimits, RateLimitConfig, ResourceLimits, CREATE_PAYMENT_RESOURCE,
};

use super::error::ValidationError;

/// Flat rate limit settings as read from the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    #[serde(default = "default_global_per_minute")]
    pub global_per_minute: u32,

    #[serde(default = "default_ip_per_minute")]
    pub ip_per_minute: u32,

    /// Payment attempts allowed per client IP in one window
    #[serde(default = "default_create_payment_limit")]
    pub create_payment_limit: u32,

    #[serde(default = "default_create_payment_window")]
    pub create_payment_window_secs: u32,
}

impl RateLimitSettings {
    /// Expands the flat settings into the limiter configuration.
    pub fn to_limiter_config(&self) -> RateLimitConfig {
        let mut config = RateLimitConfig {
            global: GlobalLimits {
                requests_per_minute: self.global_per_minute,
            },
            per_ip: IpLimits {
                requests_per_minute: self.ip_per_minute,
            },
            ..RateLimitConfig::default()
        };
        config.resources.insert(
            CREATE_PAYMENT_RESOURCE.to_string(),
            ResourceLimits {
                requests_per_window: self.create_payment_limit,
                window_secs: self.create_payment_window_secs,
            },
        );
        config
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let checks = [
            (self.global_per_minute, "global"),
            (self.ip_per_minute, "ip"),
            (self.create_payment_limit, "create_payment"),
            (self.create_payment_window_secs, "create_payment window"),
        ];
        for (value, name) in checks {
            if value == 0 {
                return Err(ValidationError::InvalidRateLimit(name));
            }
        }
        Ok(())
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            global_per_minute: default_global_per_minute(),
            ip_per_minute: default_ip_per_minute(),
            create_payment_limit: default_create_payment_limit(),
            create_payment_window_secs: default_create_payment_window(),
        }
    }
}

fn default_global_per_minute() -> u32 {
    10_000
}

fn default_ip_per_minute() -> u32 {
    100
}

fn default_create_payment_limit() -> u32 {
    5
}

fn default_create_payment_window() -> u32 {
    60
}
