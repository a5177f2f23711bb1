//! APK Market - payment core for a paid Android app marketplace.
//!
//! Buyers start a hosted Midtrans Snap checkout for a paid app; the
//! gateway's signed notifications settle the payment and grant the buyer
//! a permanent entitlement to the app.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
