//! Rate limiting middleware for axum.
//!
//! Checks the global window, then the per-IP window for the configured
//! resource. Responses carry the standard headers:
//! - `X-RateLimit-Limit`: Maximum requests allowed in the window
//! - `X-RateLimit-Remaining`: Requests remaining in the current window
//! - `X-RateLimit-Reset`: Unix timestamp when the window resets
//! - `Retry-After`: Seconds to wait (only on 429 response)
//!
//! Limiter backend errors are logged and the request continues.
//!
//! ```ignore
//! let state = RateLimitState::new(limiter).for_resource(CREATE_PAYMENT_RESOURCE);
//! let app = Router::new()
//!     .route("/api/payments", post(create_payment))
//!     .route_layer(middleware::from_fn_with_state(state, rate_limit_middleware));
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::domain::foundation::ErrorCode;
use crate::ports::{RateLimitKey, RateLimitResult, RateLimitStatus, RateLimiter};

/// Standard rate limit header names.
pub mod headers {
    use super::HeaderName;

    pub static X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
    pub static X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
    pub static X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");
}

/// Middleware state: the limiter plus the resource the route guards.
#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: Arc<dyn RateLimiter>,
    pub resource: Option<&'static str>,
}

impl RateLimitState {
    pub fn new(limiter: Arc<dyn RateLimiter>) -> Self {
        Self {
            limiter,
            resource: None,
        }
    }

    pub fn for_resource(mut self, resource: &'static str) -> Self {
        self.resource = Some(resource);
        self
    }

    fn ip_key(&self, ip: &str) -> RateLimitKey {
        let key = RateLimitKey::ip(ip);
        match self.resource {
            Some(resource) => key.for_resource(resource),
            None => key,
        }
    }
}

pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let client_ip = extract_client_ip(&request, connect_info.as_ref());

    match state.limiter.check(RateLimitKey::global()).await {
        Ok(RateLimitResult::Denied(denied)) => {
            return rate_limit_response(denied.limit, denied.retry_after_secs, &denied.message);
        }
        Err(e) => tracing::warn!(error = %e, "Rate limiter unavailable"),
        Ok(RateLimitResult::Allowed(_)) => {}
    }

    let ip_status = match &client_ip {
        Some(ip) => match state.limiter.check(state.ip_key(ip)).await {
            Ok(RateLimitResult::Denied(denied)) => {
                tracing::info!(
                    client_ip = %ip,
                    resource = state.resource.unwrap_or("-"),
                    "Rate limit exceeded"
                );
                return rate_limit_response(denied.limit, denied.retry_after_secs, &denied.message);
            }
            Ok(RateLimitResult::Allowed(status)) => Some(status),
            Err(e) => {
                tracing::warn!(error = %e, "Rate limiter unavailable for IP check");
                None
            }
        },
        None => None,
    };

    let mut response = next.run(request).await;
    if let Some(status) = ip_status {
        add_rate_limit_headers(&mut response, &status);
    }
    response
}

/// Client IP, in order of precedence:
/// 1. X-Forwarded-For header (first IP in list)
/// 2. X-Real-IP header
/// 3. ConnectInfo socket address
fn extract_client_ip<B>(
    request: &axum::http::Request<B>,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
) -> Option<String> {
    let forwarded = request
        .headers()
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = forwarded {
        return Some(ip.to_string());
    }

    let real_ip = request
        .headers()
        .get("X-Real-IP")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = real_ip {
        return Some(ip.to_string());
    }

    connect_info.map(|ci| ci.0.ip().to_string())
}

fn rate_limit_response(limit: u32, retry_after_secs: u32, message: &str) -> Response {
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(serde_json::json!({
            "error_code": ErrorCode::RateLimited.to_string(),
            "message": message,
            "details": { "retry_after_secs": retry_after_secs },
        })),
    )
        .into_response();

    let headers = response.headers_mut();
    headers.insert(headers::X_RATELIMIT_LIMIT.clone(), HeaderValue::from(limit));
    headers.insert(headers::X_RATELIMIT_REMAINING.clone(), HeaderValue::from(0u32));
    headers.insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
    response
}

fn add_rate_limit_headers(response: &mut Response, status: &RateLimitStatus) {
    let headers = response.headers_mut();
    headers.insert(headers::X_RATELIMIT_LIMIT.clone(), HeaderValue::from(status.limit));
    headers.insert(
        headers::X_RATELIMIT_REMAINING.clone(),
        HeaderValue::from(status.remaining),
    );
    headers.insert(
        headers::X_RATELIMIT_RESET.clone(),
        HeaderValue::from(status.reset_at.as_unix_secs()),
    );
}
