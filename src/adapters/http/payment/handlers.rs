//! HTTP handlers for payment endpoints.
//!
//! Thin translation between axum extractors and the application handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Json, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::de::DeserializeOwned;

use crate::application::{
    CheckOwnershipHandler, CheckOwnershipQuery, CheckoutSettings, CreatePaymentCommand,
    CreatePaymentHandler, HandleNotificationCommand, HandleNotificationHandler,
    ListPaymentsHandler, ListPaymentsQuery, ListPurchasesHandler, ListPurchasesQuery,
    UpdatePaymentStatusCommand, UpdatePaymentStatusHandler,
};
use crate::domain::foundation::UserId;
use crate::domain::payment::{NotificationVerifier, PaymentError};
use crate::ports::{AdminDirectory, AppCatalog, PaymentGateway, PaymentRepository, PurchaseRepository};

use super::super::middleware::{OptionalAuth, RequireAuth};
use super::dto::{
    CheckOwnershipParams, CreatePaymentRequest, CreatePaymentResponse, ErrorResponse,
    ListPaymentsParams, NotificationResponse, OwnershipResponse, PaymentListResponse,
    PaymentUpdatedResponse, PurchasesResponse, UpdatePaymentStatusRequest,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Dependencies shared by every payment route. Handlers are built per request.
#[derive(Clone)]
pub struct PaymentAppState {
    pub apps: Arc<dyn AppCatalog>,
    pub payments: Arc<dyn PaymentRepository>,
    pub purchases: Arc<dyn PurchaseRepository>,
    pub admins: Arc<dyn AdminDirectory>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub verifier: Arc<NotificationVerifier>,
    pub checkout: CheckoutSettings,
}

impl PaymentAppState {
    pub fn create_payment_handler(&self) -> CreatePaymentHandler {
        CreatePaymentHandler::new(
            self.apps.clone(),
            self.payments.clone(),
            self.gateway.clone(),
            self.checkout.clone(),
        )
    }

    pub fn notification_handler(&self) -> HandleNotificationHandler {
        HandleNotificationHandler::new(
            self.payments.clone(),
            self.purchases.clone(),
            self.verifier.clone(),
        )
    }

    pub fn list_purchases_handler(&self) -> ListPurchasesHandler {
        ListPurchasesHandler::new(self.purchases.clone())
    }

    pub fn check_ownership_handler(&self) -> CheckOwnershipHandler {
        CheckOwnershipHandler::new(self.purchases.clone())
    }

    pub fn list_payments_handler(&self) -> ListPaymentsHandler {
        ListPaymentsHandler::new(self.payments.clone(), self.admins.clone())
    }

    pub fn update_status_handler(&self) -> UpdatePaymentStatusHandler {
        UpdatePaymentStatusHandler::new(
            self.payments.clone(),
            self.purchases.clone(),
            self.admins.clone(),
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Buyer Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// Decodes a JSON request body. Malformed or mistyped bodies become a
/// 400 validation error in the usual error shape; an empty body reads as
/// `{}` so the handler reports the first missing field.
fn decode_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, PaymentApiError> {
    let raw: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        body
    };
    serde_json::from_slice(raw).map_err(|e| {
        tracing::debug!(error = %e, "Rejected malformed request body");
        PaymentApiError(PaymentError::validation(
            "body",
            "Request body must be a JSON object with string fields",
        ))
    })
}

/// POST /api/payments - Start a hosted checkout
pub async fn create_payment(
    State(state): State<PaymentAppState>,
    OptionalAuth(user): OptionalAuth,
    body: Bytes,
) -> Result<impl IntoResponse, PaymentApiError> {
    let req: CreatePaymentRequest = decode_body(&body)?;

    // Session identity wins over whatever the body claims.
    let user_id = match user {
        Some(user) => Some(user.id),
        None => req.user_id.and_then(|id| UserId::new(id).ok()),
    };

    let cmd = CreatePaymentCommand {
        app_id: req.app_id,
        buyer_name: req.buyer_name,
        buyer_email: req.buyer_email,
        payment_method: req.payment_method,
        user_id,
    };

    let result = state.create_payment_handler().handle(cmd).await?;
    Ok(Json(CreatePaymentResponse::from(result)))
}

/// POST /api/webhooks/midtrans - Gateway notification
///
/// Takes the raw body so a malformed payload is reported with the
/// missing field rather than a generic JSON rejection.
pub async fn handle_midtrans_notification(
    State(state): State<PaymentAppState>,
    body: Bytes,
) -> Result<impl IntoResponse, PaymentApiError> {
    let cmd = HandleNotificationCommand {
        payload: body.to_vec(),
    };

    let result = state.notification_handler().handle(cmd).await?;
    Ok(Json(NotificationResponse::from(result)))
}

/// GET /api/user/purchases
pub async fn list_user_purchases(
    State(state): State<PaymentAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, PaymentApiError> {
    let result = state
        .list_purchases_handler()
        .handle(ListPurchasesQuery { user_id: user.id })
        .await?;
    Ok(Json(PurchasesResponse::from(result)))
}

/// GET /api/user/check-ownership?app_id=
pub async fn check_ownership(
    State(state): State<PaymentAppState>,
    OptionalAuth(user): OptionalAuth,
    Query(params): Query<CheckOwnershipParams>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let query = CheckOwnershipQuery {
        user_id: user.map(|u| u.id),
        app_id: params.app_id.unwrap_or_default(),
    };

    let result = state.check_ownership_handler().handle(query).await?;
    Ok(Json(OwnershipResponse::from(result)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Operator Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/admin/payments
pub async fn list_payments(
    State(state): State<PaymentAppState>,
    RequireAuth(user): RequireAuth,
    params: Result<Query<ListPaymentsParams>, QueryRejection>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let Query(params) = params.map_err(|e| {
        tracing::debug!(error = %e, "Rejected malformed query string");
        PaymentApiError(PaymentError::validation(
            "query",
            "limit and offset must be integers",
        ))
    })?;
    let query = ListPaymentsQuery {
        requester: user.id,
        status: params.status,
        search: params.search,
        limit: params.limit,
        offset: params.offset,
    };

    let result = state.list_payments_handler().handle(query).await?;
    Ok(Json(PaymentListResponse::from(result)))
}

/// PATCH /api/admin/payments
pub async fn update_payment_status(
    State(state): State<PaymentAppState>,
    RequireAuth(user): RequireAuth,
    body: Bytes,
) -> Result<impl IntoResponse, PaymentApiError> {
    let req: UpdatePaymentStatusRequest = decode_body(&body)?;
    let cmd = UpdatePaymentStatusCommand {
        requester: user.id,
        payment_id: req.payment_id,
        status: req.status,
        transaction_id: req.transaction_id,
    };

    let result = state.update_status_handler().handle(cmd).await?;
    Ok(Json(PaymentUpdatedResponse::from(result)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts payment errors to HTTP responses.
#[derive(Debug)]
pub struct PaymentApiError(pub PaymentError);

impl From<PaymentError> for PaymentApiError {
    fn from(err: PaymentError) -> Self {
        Self(err)
    }
}

impl PaymentApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            PaymentError::Validation { .. } | PaymentError::InvalidState(_) => {
                StatusCode::BAD_REQUEST
            }
            PaymentError::Authentication(_) | PaymentError::Forbidden(_) => StatusCode::FORBIDDEN,
            PaymentError::NotFound(_) => StatusCode::NOT_FOUND,
            PaymentError::Upstream { .. } | PaymentError::Persistence(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for PaymentApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let code = self.0.code().to_string();
        let message = self.0.message();

        let body = match &self.0 {
            PaymentError::Validation { field, .. } => {
                ErrorResponse::with_details(code, message, serde_json::json!({ "field": field }))
            }
            PaymentError::Upstream { order_id, .. } => ErrorResponse::with_details(
                code,
                message,
                serde_json::json!({ "order_id": order_id }),
            ),
            _ => ErrorResponse::new(code, message),
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "Payment request failed");
        }

        (status, Json(body)).into_response()
    }
}
