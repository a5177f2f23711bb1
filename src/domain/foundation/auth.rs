//! Authentication types for the domain layer.
//!
//! `AuthenticatedUser` is what the HTTP layer hands to handlers after a
//! session token has been validated through the `SessionValidator` port.
//! Nothing here knows how tokens are issued or signed.

use super::UserId;
use thiserror::Error;

/// Buyer or operator identified by a validated session token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// The unique user identifier.
    pub id: UserId,

    /// User's email address from the token claims.
    pub email: String,

    /// Display name if the token carries one.
    pub display_name: Option<String>,
}

impl AuthenticatedUser {
    /// Creates a new authenticated user.
    pub fn new(id: UserId, email: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            id,
            email: email.into(),
            display_name,
        }
    }
}

/// Authentication errors that can occur during token validation.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The token is missing, malformed, or has an invalid signature.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// The authentication backend could not be reached.
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buyer_id() -> UserId {
        UserId::new("user-123").unwrap()
    }

    #[test]
    fn new_keeps_claims() {
        let user = AuthenticatedUser::new(buyer_id(), "rina@example.com", Some("Rina".to_string()));
        assert_eq!(user.id.as_str(), "user-123");
        assert_eq!(user.email, "rina@example.com");
        assert_eq!(user.display_name.as_deref(), Some("Rina"));
    }

    #[test]
    fn service_unavailable_displays_message() {
        let err = AuthError::service_unavailable("Connection refused");
        assert_eq!(err.to_string(), "Auth service unavailable: Connection refused");
    }
}
