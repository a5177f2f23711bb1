//! Payment handlers.
//!
//! ## Commands
//! - Creating a payment and its hosted checkout
//! - Reconciling gateway notifications
//! - Operator status override
//!
//! ## Queries
//! - Operator payment listing
//! - Buyer purchase listing
//! - App ownership check

mod admin;
mod check_ownership;
mod create_payment;
mod entitlement;
mod handle_notification;
mod list_payments;
mod list_purchases;
mod update_payment_status;

// Commands
pub use create_payment::{
    CheckoutSettings, CreatePaymentCommand, CreatePaymentHandler, CreatePaymentResult,
};
pub use handle_notification::{
    HandleNotificationCommand, HandleNotificationHandler, HandleNotificationResult,
};
pub use update_payment_status::{
    UpdatePaymentStatusCommand, UpdatePaymentStatusHandler, UpdatePaymentStatusResult,
};

// Queries
pub use check_ownership::{CheckOwnershipHandler, CheckOwnershipQuery, CheckOwnershipResult};
pub use list_payments::{ListPaymentsHandler, ListPaymentsQuery, ListPaymentsResult};
pub use list_purchases::{ListPurchasesHandler, ListPurchasesQuery, ListPurchasesResult};

pub use entitlement::EntitlementOutcome;
