//! Purchase repository port.
//!
//! Entitlements are unique per `(user_id, app_id)`. Gateway notifications
//! are delivered at least once and may race, so inserts must be safe to
//! repeat: implementations rely on a storage uniqueness constraint and
//! report the loser of a race as `AlreadyExists`.

use async_trait::async_trait;

use crate::domain::foundation::{AppId, DomainError, UserId};
use crate::domain::payment::{OwnedApp, PurchaseRecord};

/// Result of attempting to record an entitlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// Row was inserted.
    Inserted,
    /// The user already owned the app.
    AlreadyExists,
}

#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    /// Insert unless `(user_id, app_id)` already exists.
    async fn insert_if_absent(&self, purchase: &PurchaseRecord) -> Result<SaveResult, DomainError>;

    async fn find_by_user_and_app(
        &self,
        user_id: &UserId,
        app_id: &AppId,
    ) -> Result<Option<PurchaseRecord>, DomainError>;

    /// Every app the user owns, most recent purchase first.
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<OwnedApp>, DomainError>;
}
