//! Application router: payment routes plus health and tower layers.

use std::time::Duration;

use axum::{extract::DefaultBodyLimit, routing::get, Json, Router};
use http::HeaderValue;
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::middleware::{AuthState, RateLimitState};
use super::payment::{payment_router, PaymentAppState};

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Cross-cutting HTTP settings.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub request_timeout: Duration,
    /// Allowed browser origins. Empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            cors_origins: Vec::new(),
        }
    }
}

/// Builds the full router served by the binary.
pub fn app_router(
    state: PaymentAppState,
    auth: AuthState,
    rate_limit: RateLimitState,
    settings: &HttpSettings,
) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(payment_router(state, auth, rate_limit))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(settings.request_timeout))
                .layer(cors_layer(&settings.cors_origins)),
        )
}

/// GET /health
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    // Credentialed requests carry the session cookie.
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
