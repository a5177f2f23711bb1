//! Foundation module - Shared domain primitives.
//!
//! Identifiers, timestamps, the state machine contract and error types
//! that the payment domain is built on.

mod auth;
mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use auth::{AuthError, AuthenticatedUser};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{AppId, PaymentId, PurchaseId, UserId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
