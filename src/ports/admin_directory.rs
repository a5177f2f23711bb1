//! Operator privilege lookup.
//!
//! Admin rights are read from storage on every request rather than
//! trusted from token claims, so revoking them takes effect at once.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};

#[async_trait]
pub trait AdminDirectory: Send + Sync {
    /// True if the user exists and carries the admin flag.
    async fn is_admin(&self, user_id: &UserId) -> Result<bool, DomainError>;
}
