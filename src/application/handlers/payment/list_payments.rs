//! ListPaymentsHandler - operator listing of payment records.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::payment::{PaymentError, PaymentRecord, PaymentStatus};
use crate::ports::{AdminDirectory, PaymentQuery, PaymentRepository, DEFAULT_PAGE_SIZE};

use super::admin::ensure_admin;

/// Query for the operator payment list.
#[derive(Debug, Clone)]
pub struct ListPaymentsQuery {
    pub requester: UserId,
    /// Status label, or `all` / absent for no filter.
    pub status: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct ListPaymentsResult {
    pub payments: Vec<PaymentRecord>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

pub struct ListPaymentsHandler {
    payments: Arc<dyn PaymentRepository>,
    admins: Arc<dyn AdminDirectory>,
}

impl ListPaymentsHandler {
    pub fn new(payments: Arc<dyn PaymentRepository>, admins: Arc<dyn AdminDirectory>) -> Self {
        Self { payments, admins }
    }

    pub async fn handle(&self, query: ListPaymentsQuery) -> Result<ListPaymentsResult, PaymentError> {
        ensure_admin(self.admins.as_ref(), &query.requester).await?;

        let status = match query.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(label) => Some(label.parse::<PaymentStatus>()?),
        };

        let filter = PaymentQuery {
            status,
            search: query.search,
            limit: query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            offset: query.offset.unwrap_or(0),
        }
        .normalized();

        let page = self.payments.list(&filter).await?;

        Ok(ListPaymentsResult {
            payments: page.items,
            total: page.total,
            limit: filter.limit,
            offset: filter.offset,
        })
    }
}
