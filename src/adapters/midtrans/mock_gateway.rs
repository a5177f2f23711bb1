//! Mock payment gateway for tests.
//!
//! Records every checkout request and either returns a generated Snap-like
//! handle or a preset error.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use crate::ports::{CheckoutHandle, CheckoutRequest, GatewayError, PaymentGateway};

use super::snap_client::SANDBOX_BASE_URL;

#[derive(Debug, Default)]
pub struct MockPaymentGateway {
    requests: Mutex<Vec<CheckoutRequest>>,
    error: Mutex<Option<GatewayError>>,
}

impl MockPaymentGateway {
    /// A gateway that accepts every checkout.
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway that rejects every checkout with `error`.
    pub fn failing(error: GatewayError) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            error: Mutex::new(Some(error)),
        }
    }

    /// Changes the outcome of subsequent checkouts.
    pub fn set_error(&self, error: Option<GatewayError>) {
        *self.error.lock().unwrap_or_else(|p| p.into_inner()) = error;
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<CheckoutRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_checkout(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutHandle, GatewayError> {
        self.requests
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(request);

        if let Some(error) = self.error.lock().unwrap_or_else(|p| p.into_inner()).clone() {
            return Err(error);
        }

        let token = uuid::Uuid::new_v4().to_string();
        let redirect_url = format!("{}/snap/v2/vtweb/{}", SANDBOX_BASE_URL, token);
        Ok(CheckoutHandle {
            raw: json!({ "token": token, "redirect_url": redirect_url }),
            token,
            redirect_url,
        })
    }
}
