//! Axum router for payment endpoints.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::adapters::rate_limiter::CREATE_PAYMENT_RESOURCE;

use super::super::middleware::{auth_middleware, rate_limit_middleware, AuthState, RateLimitState};
use super::handlers::{
    check_ownership, create_payment, handle_midtrans_notification, list_payments,
    list_user_purchases, update_payment_status, PaymentAppState,
};

/// Builds the payment routes.
///
/// ## Session routes (token optional unless noted)
/// - `POST /api/payments` - rate limited per client IP
/// - `GET /api/user/purchases` - requires a session
/// - `GET /api/user/check-ownership`
/// - `GET|PATCH /api/admin/payments` - requires an admin session
///
/// ## Webhook routes (no session, signature verified)
/// - `POST /api/webhooks/midtrans`
pub fn payment_router(
    state: PaymentAppState,
    auth: AuthState,
    rate_limit: RateLimitState,
) -> Router {
    let rate_limit = rate_limit.for_resource(CREATE_PAYMENT_RESOURCE);

    let checkout = Router::new()
        .route("/api/payments", post(create_payment))
        .route_layer(middleware::from_fn_with_state(rate_limit, rate_limit_middleware));

    let session_routes = Router::new()
        .merge(checkout)
        .route("/api/user/purchases", get(list_user_purchases))
        .route("/api/user/check-ownership", get(check_ownership))
        .route(
            "/api/admin/payments",
            get(list_payments).patch(update_payment_status),
        )
        .layer(middleware::from_fn_with_state(auth, auth_middleware));

    let webhook_routes =
        Router::new().route("/api/webhooks/midtrans", post(handle_midtrans_notification));

    Router::new()
        .merge(session_routes)
        .merge(webhook_routes)
        .with_state(state)
}
