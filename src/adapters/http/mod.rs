//! HTTP adapters - REST API implementations.
//!
//! - `middleware` - session auth and rate limiting
//! - `payment` - marketplace payment endpoints
//! - `router` - full application router with health and tower layers

pub mod middleware;
pub mod payment;
pub mod router;

pub use payment::{payment_router, PaymentAppState};
pub use router::{app_router, HttpSettings};
