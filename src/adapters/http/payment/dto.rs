//! Request and response bodies for payment endpoints.
//!
//! Checkout responses carry `checkout_token` / `checkout_url`. The older
//! storefront pages read `snap_token` / `payment_url`, so those are sent
//! as well with the same values.

use serde::{Deserialize, Serialize};

use crate::application::{
    CheckOwnershipResult, CreatePaymentResult, HandleNotificationResult, ListPaymentsResult,
    ListPurchasesResult, UpdatePaymentStatusResult,
};
use crate::domain::foundation::Timestamp;
use crate::domain::payment::{OwnedApp, PaymentRecord};

// ════════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /api/payments`. Missing fields are reported by the
/// handler with the field name, so everything defaults to empty here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreatePaymentRequest {
    pub app_id: String,
    pub buyer_name: String,
    pub buyer_email: String,
    pub payment_method: String,
    /// Used only when the request carries no session.
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckOwnershipParams {
    #[serde(default)]
    pub app_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListPaymentsParams {
    pub status: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdatePaymentStatusRequest {
    pub payment_id: String,
    pub status: String,
    pub transaction_id: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct CreatePaymentResponse {
    pub success: bool,
    pub order_id: String,
    pub payment_id: String,
    pub amount: i64,
    pub currency: String,
    pub app_name: String,
    pub buyer_email: String,
    pub checkout_token: String,
    pub checkout_url: String,
    pub snap_token: String,
    pub payment_url: String,
    pub message: String,
}

impl From<CreatePaymentResult> for CreatePaymentResponse {
    fn from(result: CreatePaymentResult) -> Self {
        Self {
            success: true,
            order_id: result.order_id.to_string(),
            payment_id: result.payment_id.to_string(),
            amount: result.amount,
            currency: result.currency,
            app_name: result.app_name,
            buyer_email: result.buyer_email,
            snap_token: result.checkout_token.clone(),
            payment_url: result.checkout_url.clone(),
            checkout_token: result.checkout_token,
            checkout_url: result.checkout_url,
            message: "Payment created successfully! Redirecting to payment page...".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationResponse {
    pub success: bool,
    pub message: String,
    pub order_id: String,
    pub status: String,
}

impl From<HandleNotificationResult> for NotificationResponse {
    fn from(result: HandleNotificationResult) -> Self {
        Self {
            success: true,
            message: "Webhook processed successfully".to_string(),
            order_id: result.order_id.to_string(),
            status: result.status.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchasesResponse {
    pub success: bool,
    pub purchases: Vec<OwnedApp>,
    pub total_purchases: usize,
}

impl From<ListPurchasesResult> for PurchasesResponse {
    fn from(result: ListPurchasesResult) -> Self {
        Self {
            success: true,
            total_purchases: result.purchases.len(),
            purchases: result.purchases,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnershipResponse {
    pub success: bool,
    pub owns_app: bool,
    pub authenticated: bool,
    pub purchase_date: Option<Timestamp>,
}

impl From<CheckOwnershipResult> for OwnershipResponse {
    fn from(result: CheckOwnershipResult) -> Self {
        Self {
            success: true,
            owns_app: result.owns_app,
            authenticated: result.authenticated,
            purchase_date: result.purchase_date,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentListResponse {
    pub success: bool,
    pub payments: Vec<PaymentRecord>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl From<ListPaymentsResult> for PaymentListResponse {
    fn from(result: ListPaymentsResult) -> Self {
        Self {
            success: true,
            payments: result.payments,
            total: result.total,
            limit: result.limit,
            offset: result.offset,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentUpdatedResponse {
    pub success: bool,
    pub message: String,
    pub payment: PaymentRecord,
}

impl From<UpdatePaymentStatusResult> for PaymentUpdatedResponse {
    fn from(result: UpdatePaymentStatusResult) -> Self {
        Self {
            success: true,
            message: format!("Payment status changed to {}", result.payment.status),
            payment: result.payment,
        }
    }
}

/// Error body shared by every payment endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error_code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error_code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::EntitlementOutcome;
    use crate::domain::foundation::PaymentId;
    use crate::domain::payment::{OrderId, PaymentStatus, StatusChange};

    #[test]
    fn create_request_tolerates_missing_fields() {
        let req: CreatePaymentRequest =
            serde_json::from_str(r#"{"app_id":"x","buyer_email":"a@b.co"}"#).unwrap();
        assert_eq!(req.app_id, "x");
        assert!(req.buyer_name.is_empty());
        assert!(req.user_id.is_none());
    }

    #[test]
    fn create_response_uses_storefront_field_names() {
        let response = CreatePaymentResponse::from(CreatePaymentResult {
            order_id: OrderId::new("ORDER-1-ABC").unwrap(),
            payment_id: PaymentId::new(),
            amount: 25_000,
            currency: "IDR".to_string(),
            app_name: "Pocket Ledger".to_string(),
            buyer_email: "rina@example.com".to_string(),
            checkout_token: "tok".to_string(),
            checkout_url: "https://pay/tok".to_string(),
        });

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["checkout_token"], "tok");
        assert_eq!(json["checkout_url"], "https://pay/tok");
        assert_eq!(json["snap_token"], json["checkout_token"]);
        assert_eq!(json["payment_url"], json["checkout_url"]);
        assert_eq!(json["order_id"], "ORDER-1-ABC");
    }

    #[test]
    fn notification_response_reports_status_label() {
        let response = NotificationResponse::from(HandleNotificationResult {
            order_id: OrderId::new("ORDER-1-ABC").unwrap(),
            status: PaymentStatus::Verified,
            change: StatusChange::Transitioned {
                from: PaymentStatus::Pending,
                to: PaymentStatus::Verified,
            },
            entitlement: EntitlementOutcome::Granted,
        });

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["message"], "Webhook processed successfully");
        assert_eq!(json["status"], "verified");
    }

    #[test]
    fn error_response_omits_empty_details() {
        let json = serde_json::to_value(ErrorResponse::new("PAYMENT_NOT_FOUND", "Payment not found"))
            .unwrap();
        assert!(json.get("details").is_none());
    }
}
