//! Midtrans payment gateway adapter.
//!
//! Implements the `PaymentGateway` port against the Snap API:
//! - `SnapGateway` - hosted checkout creation over HTTPS
//! - `MockPaymentGateway` - recorded requests and injected failures for tests
//!
//! Notification signatures are verified in the domain
//! (`NotificationVerifier`), not here.
//!
//! # Configuration
//!
//! - server key: used for HTTP basic auth and notification signatures
//! - production flag: selects `https://app.midtrans.com` over the sandbox

mod mock_gateway;
mod snap_client;

pub use mock_gateway::MockPaymentGateway;
pub use snap_client::{SnapConfig, SnapGateway, PRODUCTION_BASE_URL, SANDBOX_BASE_URL};
