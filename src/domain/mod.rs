//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, auth)
//! - `payment` - Checkout attempts, gateway reconciliation, entitlements

pub mod foundation;
pub mod payment;
