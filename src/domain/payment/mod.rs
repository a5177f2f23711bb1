//! Payment domain module.
//!
//! Checkout attempts, the payment status state machine, gateway
//! notification handling, and purchase entitlements.
//!
//! # Module Structure
//!
//! - `status` - PaymentStatus state machine
//! - `gateway_status` - gateway vocabulary and its mapping
//! - `order` - order ids and download tokens
//! - `checkout` - request validation and the catalogue view of an app
//! - `notification` - notification parsing and signature verification
//! - `record` - PaymentRecord aggregate
//! - `purchase` - PurchaseRecord entitlement

mod checkout;
mod errors;
mod gateway_status;
mod notification;
mod order;
mod purchase;
mod record;
mod status;

pub use checkout::{parse_app_id, AppListing, BuyerDetails, DEFAULT_CURRENCY};
pub use errors::PaymentError;
pub use gateway_status::{map_gateway_status, map_raw_gateway_status, FraudStatus, TransactionStatus};
pub use notification::{GatewayNotification, NotificationVerifier};
pub use order::{DownloadToken, OrderId, DEFAULT_TOKEN_TTL_HOURS};
pub use purchase::{OwnedApp, PurchaseRecord};
pub use record::{PaymentRecord, StatusChange};
pub use status::PaymentStatus;
