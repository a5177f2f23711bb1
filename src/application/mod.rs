//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Commands (write) and queries (read) each get their own handler.

pub mod handlers;

pub use handlers::payment::{
    CheckOwnershipHandler, CheckOwnershipQuery, CheckOwnershipResult, CheckoutSettings,
    CreatePaymentCommand, CreatePaymentHandler, CreatePaymentResult, EntitlementOutcome,
    HandleNotificationCommand, HandleNotificationHandler, HandleNotificationResult,
    ListPaymentsHandler, ListPaymentsQuery, ListPaymentsResult, ListPurchasesHandler,
    ListPurchasesQuery, ListPurchasesResult, UpdatePaymentStatusCommand,
    UpdatePaymentStatusHandler, UpdatePaymentStatusResult,
};
