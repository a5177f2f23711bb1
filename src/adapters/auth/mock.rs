//! Mock session validator for tests.
//!
//! ```ignore
//! let validator = MockSessionValidator::new().with_test_user("token-1", "user-1");
//! let user = validator.validate("token-1").await?;
//! ```

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Token table. Unknown tokens return `InvalidToken`.
#[derive(Debug, Default)]
pub struct MockSessionValidator {
    tokens: RwLock<HashMap<String, AuthenticatedUser>>,
    force_error: RwLock<Option<AuthError>>,
}

impl MockSessionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `token` for `user`.
    pub fn with_user(self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.add_token(token, user);
        self
    }

    /// Registers `token` for a generated user with the given id.
    ///
    /// Blank ids are ignored.
    pub fn with_test_user(self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        let Ok(id) = UserId::new(&user_id) else {
            return self;
        };
        let user = AuthenticatedUser::new(
            id,
            format!("{}@test.example.com", user_id),
            Some(format!("Test User {}", user_id)),
        );
        self.with_user(token, user)
    }

    /// Every validation returns `error`.
    pub fn with_error(self, error: AuthError) -> Self {
        *self
            .force_error
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(error);
        self
    }

    pub fn add_token(&self, token: impl Into<String>, user: AuthenticatedUser) {
        self.tokens
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(token.into(), user);
    }
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if let Some(error) = self
            .force_error
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
        {
            return Err(error);
        }

        self.tokens
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn known_token_returns_user() {
        let validator = MockSessionValidator::new().with_test_user("tok", "user-1");
        let user = validator.validate("tok").await.unwrap();
        assert_eq!(user.id.as_str(), "user-1");
        assert_eq!(user.email, "user-1@test.example.com");
    }

    #[tokio::test]
    async fn unknown_token_is_invalid() {
        let validator = MockSessionValidator::new();
        assert!(matches!(
            validator.validate("nope").await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn forced_error_wins() {
        let validator = MockSessionValidator::new()
            .with_test_user("tok", "user-1")
            .with_error(AuthError::service_unavailable("down"));
        assert!(matches!(
            validator.validate("tok").await,
            Err(AuthError::ServiceUnavailable(_))
        ));
    }
}
