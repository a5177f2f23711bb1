//! PostgreSQL adapters - sqlx implementations of the persistence ports.
//!
//! - `PostgresPaymentRepository` - checkout attempts and their gateway state
//! - `PostgresPurchaseRepository` - entitlements, unique per user and app
//! - `PostgresAppCatalog` - read-only app listings
//! - `PostgresAdminDirectory` - `users.is_admin` lookups

mod admin_directory;
mod app_catalog;
mod payment_repository;
mod purchase_repository;

pub use admin_directory::PostgresAdminDirectory;
pub use app_catalog::PostgresAppCatalog;
pub use payment_repository::PostgresPaymentRepository;
pub use purchase_repository::PostgresPurchaseRepository;

use crate::domain::foundation::{DomainError, ErrorCode};

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

fn corrupt_row(message: impl std::fmt::Display) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Invalid stored value: {}", message))
}
