//! HTTP adapter for marketplace payment endpoints.
//!
//! - `POST /api/payments` - Start a checkout for a paid app
//! - `POST /api/webhooks/midtrans` - Gateway payment notifications
//! - `GET /api/user/purchases` - Apps owned by the signed-in buyer
//! - `GET /api/user/check-ownership` - Does the caller own an app
//! - `GET /api/admin/payments` - Operator payment listing
//! - `PATCH /api/admin/payments` - Operator status override

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{PaymentApiError, PaymentAppState};
pub use routes::payment_router;
