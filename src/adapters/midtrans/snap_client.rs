//! Snap API client.
//!
//! ```ignore
//! let config = SnapConfig::new(server_key, false);
//! let gateway = SnapGateway::new(config);
//! let handle = gateway.create_checkout(request).await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::ports::{CheckoutHandle, CheckoutRequest, GatewayError, GatewayErrorCode, PaymentGateway};

pub const SANDBOX_BASE_URL: &str = "https://app.sandbox.midtrans.com";
pub const PRODUCTION_BASE_URL: &str = "https://app.midtrans.com";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Snap API configuration.
#[derive(Clone)]
pub struct SnapConfig {
    server_key: SecretString,
    base_url: String,
    timeout: Duration,
}

impl SnapConfig {
    pub fn new(server_key: SecretString, is_production: bool) -> Self {
        let base_url = if is_production {
            PRODUCTION_BASE_URL
        } else {
            SANDBOX_BASE_URL
        };
        Self {
            server_key,
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Points the client at another host (tests, proxies).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn transactions_url(&self) -> String {
        format!("{}/snap/v1/transactions", self.base_url.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for SnapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapConfig")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Snap checkout client.
pub struct SnapGateway {
    config: SnapConfig,
    http_client: reqwest::Client,
}

impl SnapGateway {
    pub fn new(config: SnapConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });
        Self {
            config,
            http_client,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SnapTransaction {
    token: String,
    redirect_url: String,
}

#[derive(Debug, Default, Deserialize)]
struct SnapErrorBody {
    #[serde(default)]
    error_messages: Vec<String>,
}

/// Request body for `POST /snap/v1/transactions`.
fn snap_body(request: &CheckoutRequest) -> Value {
    json!({
        "transaction_details": {
            "order_id": request.order_id,
            "gross_amount": request.gross_amount,
        },
        "customer_details": {
            "first_name": request.customer.first_name,
            "email": request.customer.email,
        },
        "item_details": [{
            "id": request.item.id,
            "price": request.item.price,
            "quantity": request.item.quantity,
            "name": request.item.name,
            "category": request.item.category,
            "merchant_name": request.item.merchant_name,
        }],
        "enabled_payments": request.enabled_payments,
        "callbacks": {
            "finish": request.callbacks.finish,
            "error": request.callbacks.error,
            "pending": request.callbacks.pending,
        },
    })
}

/// Maps a non-success Snap response to a gateway error.
fn error_from_response(status: u16, body: &str) -> GatewayError {
    let parsed: SnapErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = if parsed.error_messages.is_empty() {
        format!("Snap API returned HTTP {}", status)
    } else {
        parsed.error_messages.join("; ")
    };

    let code = match status {
        401 | 403 => GatewayErrorCode::AuthenticationError,
        429 => GatewayErrorCode::RateLimitExceeded,
        500..=599 => GatewayErrorCode::NetworkError,
        _ => GatewayErrorCode::Rejected,
    };

    GatewayError::new(code, message).with_provider_code(status.to_string())
}

fn handle_from_response(raw: Value) -> Result<CheckoutHandle, GatewayError> {
    let transaction: SnapTransaction = serde_json::from_value(raw.clone()).map_err(|e| {
        GatewayError::invalid_response(format!("Failed to parse Snap response: {}", e))
    })?;
    Ok(CheckoutHandle {
        token: transaction.token,
        redirect_url: transaction.redirect_url,
        raw,
    })
}

#[async_trait]
impl PaymentGateway for SnapGateway {
    async fn create_checkout(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutHandle, GatewayError> {
        let response = self
            .http_client
            .post(self.config.transactions_url())
            .basic_auth(self.config.server_key.expose_secret(), Some(""))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&snap_body(&request))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(order_id = %request.order_id, error = %e, "Snap request failed");
                GatewayError::network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                order_id = %request.order_id,
                status = status.as_u16(),
                body = %body,
                "Snap rejected checkout"
            );
            return Err(error_from_response(status.as_u16(), &body));
        }

        let raw: Value = response.json().await.map_err(|e| {
            GatewayError::invalid_response(format!("Failed to parse Snap response: {}", e))
        })?;
        let handle = handle_from_response(raw)?;

        tracing::info!(order_id = %request.order_id, "Snap checkout created");
        Ok(handle)
    }
}

impl std::fmt::Debug for SnapGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapGateway")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
