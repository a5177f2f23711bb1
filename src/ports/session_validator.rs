//! Session validation port.
//!
//! Validates the session token a signed-in buyer or operator presents
//! and resolves it to an `AuthenticatedUser`.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Validates session tokens and extracts user identity.
///
/// # Contract
///
/// Implementations must:
/// - Validate the token signature and expiry
/// - Return `AuthError::InvalidToken` for malformed or badly signed tokens
/// - Return `AuthError::TokenExpired` for expired tokens
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Validate a raw token (no `Bearer ` prefix).
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use std::collections::HashMap;
    use std::sync::RwLock;

    struct FixedSessions {
        tokens: RwLock<HashMap<String, AuthenticatedUser>>,
    }

    #[async_trait]
    impl SessionValidator for FixedSessions {
        async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
            self.tokens
                .read()
                .map_err(|_| AuthError::service_unavailable("lock poisoned"))?
                .get(token)
                .cloned()
                .ok_or(AuthError::InvalidToken)
        }
    }

    #[tokio::test]
    async fn dyn_validator_resolves_known_token() {
        let mut tokens = HashMap::new();
        tokens.insert(
            "tok-1".to_string(),
            AuthenticatedUser::new(UserId::new("user-1").unwrap(), "a@b.co", None),
        );
        let validator: Box<dyn SessionValidator> = Box::new(FixedSessions {
            tokens: RwLock::new(tokens),
        });

        let user = validator.validate("tok-1").await.unwrap();
        assert_eq!(user.id.as_str(), "user-1");
        assert!(matches!(
            validator.validate("nope").await,
            Err(AuthError::InvalidToken)
        ));
    }
}
