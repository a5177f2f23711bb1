//! Rate limiter adapters.
//!
//! - `InMemoryRateLimiter` - single instance, tests and local development
//! - `RedisRateLimiter` - shared windows for multi-instance deployments

mod config;
mod in_memory;
mod redis;

pub use config::{GlobalLimits, IpLimits, RateLimitConfig, ResourceLimits, CREATE_PAYMENT_RESOURCE};
pub use in_memory::InMemoryRateLimiter;
pub use redis::RedisRateLimiter;
