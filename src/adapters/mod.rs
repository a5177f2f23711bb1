//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - PostgreSQL repositories (sqlx)
//! - `memory` - in-process store for tests and local runs
//! - `midtrans` - Snap checkout client and a scriptable mock
//! - `auth` - session token validation
//! - `rate_limiter` - in-memory and Redis fixed-window limiters
//! - `http` - axum routes, DTOs and middleware

pub mod auth;
pub mod http;
pub mod memory;
pub mod midtrans;
pub mod postgres;
pub mod rate_limiter;
