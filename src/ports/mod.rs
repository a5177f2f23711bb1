//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence
//!
//! - `PaymentRepository` - checkout attempts
//! - `PurchaseRepository` - entitlements, idempotent insert
//! - `AppCatalog` - read-only app lookup
//! - `AdminDirectory` - operator privilege lookup
//!
//! ## External services
//!
//! - `PaymentGateway` - hosted checkout creation
//! - `SessionValidator` - session token validation
//! - `RateLimiter` - request throttling

mod admin_directory;
mod app_catalog;
mod payment_gateway;
mod payment_repository;
mod purchase_repository;
mod rate_limiter;
mod session_validator;

pub use admin_directory::AdminDirectory;
pub use app_catalog::AppCatalog;
pub use payment_gateway::{
    CheckoutCallbacks, CheckoutHandle, CheckoutItem, CheckoutRequest, CustomerDetails,
    GatewayError, GatewayErrorCode, PaymentGateway,
};
pub use payment_repository::{
    PaymentPage, PaymentQuery, PaymentRepository, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use purchase_repository::{PurchaseRepository, SaveResult};
pub use rate_limiter::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimitScope,
    RateLimitStatus, RateLimiter,
};
pub use session_validator::SessionValidator;
