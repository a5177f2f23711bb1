//! Payment gateway port for hosted checkout creation.
//!
//! The gateway owns the payment page. We hand it an order and get back
//! an opaque token plus the URL the buyer is redirected to. Payment
//! results arrive later as signed notifications, which are handled in
//! the domain and never go through this port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Port for hosted-checkout payment gateways.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted checkout for one order.
    ///
    /// Implementations must not retry; the caller records the failure.
    async fn create_checkout(&self, request: CheckoutRequest)
        -> Result<CheckoutHandle, GatewayError>;
}

/// Everything the gateway needs to render a checkout page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub order_id: String,
    pub gross_amount: i64,
    pub currency: String,
    pub customer: CustomerDetails,
    pub item: CheckoutItem,
    /// Payment channels offered on the hosted page.
    pub enabled_payments: Vec<String>,
    pub callbacks: CheckoutCallbacks,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub first_name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutItem {
    pub id: String,
    pub price: i64,
    pub quantity: u32,
    pub name: String,
    pub category: String,
    pub merchant_name: String,
}

/// Where the hosted page sends the buyer afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutCallbacks {
    pub finish: String,
    pub error: String,
    pub pending: String,
}

impl CheckoutCallbacks {
    /// Builds the storefront return URLs for an order.
    pub fn for_order(base_url: &str, order_id: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            finish: format!("{}/dashboard.html?payment=success&order_id={}", base, order_id),
            error: format!("{}/checkout.html?payment=error&order_id={}", base, order_id),
            pending: format!("{}/dashboard.html?payment=pending&order_id={}", base, order_id),
        }
    }
}

/// Opaque handle to a created checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutHandle {
    pub token: String,
    pub redirect_url: String,
    /// Gateway response body, stored for reconciliation.
    pub raw: Value,
}

/// Gateway error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    /// Error code for categorization.
    pub code: GatewayErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Gateway's own status or error code, if it sent one.
    pub provider_code: Option<String>,

    /// Whether a later attempt might succeed.
    pub retryable: bool,
}

impl GatewayError {
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::NetworkError, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::AuthenticationError, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Rejected, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::InvalidResponse, message)
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {}

impl From<GatewayError> for DomainError {
    fn from(err: GatewayError) -> Self {
        DomainError::new(ErrorCode::GatewayError, err.message)
    }
}

/// Gateway error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorCode {
    /// Network connectivity issue or timeout.
    NetworkError,

    /// Server key rejected.
    AuthenticationError,

    /// Gateway refused the request (validation, duplicate order id).
    Rejected,

    /// Gateway is throttling us.
    RateLimitExceeded,

    /// Response could not be understood.
    InvalidResponse,
}

impl GatewayErrorCode {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayErrorCode::NetworkError | GatewayErrorCode::RateLimitExceeded
        )
    }
}

impl std::fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GatewayErrorCode::NetworkError => "network_error",
            GatewayErrorCode::AuthenticationError => "authentication_error",
            GatewayErrorCode::Rejected => "rejected",
            GatewayErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            GatewayErrorCode::InvalidResponse => "invalid_response",
        };
        write!(f, "{}", s)
    }
}
