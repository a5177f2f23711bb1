//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `APK_MARKET` prefix
//! and nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use apk_market::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod auth;
mod database;
mod error;
mod payment;
mod rate_limit;
mod redis;
mod server;

pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::{PaymentConfig, DEFAULT_ENABLED_PAYMENTS};
pub use rate_limit::RateLimitSettings;
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    pub database: DatabaseConfig,

    /// Shared rate limiter backend. In-memory limits are used when absent.
    pub redis: Option<RedisConfig>,

    pub auth: AuthConfig,

    pub payment: PaymentConfig,

    #[serde(default)]
    pub rate_limit: RateLimitSettings,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Reads a `.env` file when present, then every `APK_MARKET__*`
    /// variable, e.g.:
    ///
    /// - `APK_MARKET__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `APK_MARKET__PAYMENT__MIDTRANS_SERVER_KEY=...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("APK_MARKET")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Semantic checks that deserialization cannot express.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        if let Some(redis) = &self.redis {
            redis.validate()?;
        }
        self.auth.validate(self.server.environment)?;
        self.payment.validate()?;
        self.rate_limit.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
