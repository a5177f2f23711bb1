//! Session token configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

const MIN_PRODUCTION_SECRET_LEN: usize = 16;

/// HS256 session token settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared secret the login service signs session tokens with
    pub jwt_secret: SecretString,

    /// Cookie carrying the session token when no bearer header is sent
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

impl AuthConfig {
    pub fn validate(&self, environment: Environment) -> Result<(), ValidationError> {
        let secret = self.jwt_secret.expose_secret();
        if secret.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__JWT_SECRET"));
        }
        if environment == Environment::Production && secret.len() < MIN_PRODUCTION_SECRET_LEN {
            return Err(ValidationError::WeakJwtSecret);
        }
        if self.cookie_name.trim().is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__COOKIE_NAME"));
        }
        Ok(())
    }
}

fn default_cookie_name() -> String {
    "auth_token".to_string()
}
