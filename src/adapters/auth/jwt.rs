//! HS256 session token validator.
//!
//! Tokens are issued by the marketplace login flow and carry
//! `userId`, `email`, an optional `name` and `exp`. This adapter only
//! verifies them; issuing lives outside this service.

use async_trait::async_trait;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Claims carried by a marketplace session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(rename = "userId", deserialize_with = "string_or_number")]
    pub user_id: String,

    pub email: String,

    #[serde(default)]
    pub name: Option<String>,

    /// Expiry (Unix epoch seconds).
    pub exp: i64,
}

/// Validates HS256 session tokens against the shared signing secret.
pub struct JwtSessionValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtSessionValidator {
    pub fn new(secret: &SecretString) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Session token expired");
                    AuthError::TokenExpired
                }
                _ => {
                    tracing::debug!(error = %e, "Session token rejected");
                    AuthError::InvalidToken
                }
            })?;

        let claims = data.claims;
        let user_id = UserId::new(claims.user_id).map_err(|_| {
            tracing::warn!("Session token carries a blank userId");
            AuthError::InvalidToken
        })?;

        Ok(AuthenticatedUser::new(user_id, claims.email, claims.name))
    }
}

impl std::fmt::Debug for JwtSessionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSessionValidator")
            .field("algorithm", &Algorithm::HS256)
            .finish_non_exhaustive()
    }
}

/// Older tokens carry a numeric user id.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}
