//! Read-only access to the app catalogue.

use async_trait::async_trait;

use crate::domain::foundation::{AppId, DomainError};
use crate::domain::payment::AppListing;

#[async_trait]
pub trait AppCatalog: Send + Sync {
    /// Look up an app by id. `None` when it does not exist.
    async fn find_by_id(&self, id: &AppId) -> Result<Option<AppListing>, DomainError>;
}
