//! Payment repository port.
//!
//! Persists `PaymentRecord` aggregates. Rows are never deleted here.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, PaymentId};
use crate::domain::payment::{OrderId, PaymentRecord, PaymentStatus};

/// Default page size for operator listings.
pub const DEFAULT_PAGE_SIZE: i64 = 50;
/// Largest page an operator listing may request.
pub const MAX_PAGE_SIZE: i64 = 200;

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Insert a new record.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure or duplicate order id
    async fn insert(&self, record: &PaymentRecord) -> Result<(), DomainError>;

    /// Overwrite the mutable columns of an existing record.
    ///
    /// # Errors
    ///
    /// - `PaymentNotFound` if no row has this id
    /// - `DatabaseError` on persistence failure
    async fn update(&self, record: &PaymentRecord) -> Result<(), DomainError>;

    /// Overwrite the mutable columns only while the stored status is still
    /// `expected`. Returns `false` when the row moved on (or is gone) and
    /// nothing was written.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn update_if_status(
        &self,
        record: &PaymentRecord,
        expected: PaymentStatus,
    ) -> Result<bool, DomainError>;

    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<PaymentRecord>, DomainError>;

    async fn find_by_order_id(&self, order_id: &OrderId)
        -> Result<Option<PaymentRecord>, DomainError>;

    /// Operator listing, newest first.
    async fn list(&self, query: &PaymentQuery) -> Result<PaymentPage, DomainError>;
}

/// Filters for operator listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentQuery {
    pub status: Option<PaymentStatus>,
    /// Case-insensitive substring of buyer email, buyer name or order id.
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for PaymentQuery {
    fn default() -> Self {
        Self {
            status: None,
            search: None,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl PaymentQuery {
    /// Clamps paging and drops blank search terms.
    pub fn normalized(mut self) -> Self {
        self.limit = self.limit.clamp(1, MAX_PAGE_SIZE);
        self.offset = self.offset.max(0);
        self.search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }

    /// In-process equivalent of the storage filter.
    pub fn matches(&self, record: &PaymentRecord) -> bool {
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        match &self.search {
            None => true,
            Some(term) => {
                let term = term.to_lowercase();
                [
                    record.buyer_email.as_str(),
                    record.buyer_name.as_str(),
                    record.order_id.as_str(),
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&term))
            }
        }
    }
}

/// One page of payments plus the unpaged total.
#[derive(Debug, Clone)]
pub struct PaymentPage {
    pub items: Vec<PaymentRecord>,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn PaymentRepository) {}
    }

    #[test]
    fn normalized_clamps_paging() {
        let q = PaymentQuery {
            limit: 10_000,
            offset: -5,
            search: Some("   ".to_string()),
            ..Default::default()
        }
        .normalized();

        assert_eq!(q.limit, MAX_PAGE_SIZE);
        assert_eq!(q.offset, 0);
        assert!(q.search.is_none());

        let q = PaymentQuery {
            limit: 0,
            ..Default::default()
        }
        .normalized();
        assert_eq!(q.limit, 1);
    }

    #[test]
    fn default_query_uses_standard_page() {
        let q = PaymentQuery::default();
        assert_eq!(q.limit, 50);
        assert_eq!(q.offset, 0);
    }
}
