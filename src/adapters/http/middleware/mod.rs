//! HTTP middleware for axum.
//!
//! - `auth` - Session token validation and user extractors
//! - `rate_limit` - Fixed-window request limits keyed by client IP

pub mod auth;
pub mod rate_limit;

pub use auth::{auth_middleware, AuthRejection, AuthState, OptionalAuth, RequireAuth};
pub use rate_limit::{rate_limit_middleware, RateLimitState};
