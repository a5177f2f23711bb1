//! CreatePaymentHandler - starts a checkout for a paid app.

use std::sync::Arc;

use crate::domain::foundation::{PaymentId, Timestamp, UserId};
use crate::domain::payment::{
    parse_app_id, BuyerDetails, OrderId, PaymentError, PaymentRecord, PaymentStatus,
};
use crate::ports::{
    AppCatalog, CheckoutCallbacks, CheckoutItem, CheckoutRequest, CustomerDetails,
    PaymentGateway, PaymentRepository,
};

/// Storefront settings applied to every checkout.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    /// Public storefront URL used for the post-payment redirects.
    pub public_base_url: String,
    pub merchant_name: String,
    pub enabled_payments: Vec<String>,
    pub token_ttl_hours: i64,
}

/// Command to create a payment.
#[derive(Debug, Clone)]
pub struct CreatePaymentCommand {
    pub app_id: String,
    pub buyer_name: String,
    pub buyer_email: String,
    pub payment_method: String,
    /// Buyer account, when signed in.
    pub user_id: Option<UserId>,
}

/// Result of a successful payment creation.
#[derive(Debug, Clone)]
pub struct CreatePaymentResult {
    pub order_id: OrderId,
    pub payment_id: PaymentId,
    pub amount: i64,
    pub currency: String,
    pub app_name: String,
    pub buyer_email: String,
    pub checkout_token: String,
    pub checkout_url: String,
}

/// Handler for creating payments.
///
/// The pending record is written before the gateway is called, so a
/// gateway failure still leaves an auditable failed attempt.
pub struct CreatePaymentHandler {
    apps: Arc<dyn AppCatalog>,
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    settings: CheckoutSettings,
}

impl CreatePaymentHandler {
    pub fn new(
        apps: Arc<dyn AppCatalog>,
        payments: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn PaymentGateway>,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            apps,
            payments,
            gateway,
            settings,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreatePaymentCommand,
    ) -> Result<CreatePaymentResult, PaymentError> {
        // 1. Validate input before touching storage
        let app_id = parse_app_id(&cmd.app_id)?;
        let buyer = BuyerDetails::parse(&cmd.buyer_name, &cmd.buyer_email, &cmd.payment_method)?;

        // 2. Resolve the app
        let app = self
            .apps
            .find_by_id(&app_id)
            .await?
            .ok_or_else(|| PaymentError::not_found("App not found"))?;
        app.ensure_purchasable()?;

        // 3. Persist the pending attempt
        let mut record = PaymentRecord::create_pending(
            &app,
            buyer,
            cmd.user_id,
            self.settings.token_ttl_hours,
            Timestamp::now(),
        );
        self.payments.insert(&record).await.map_err(|e| {
            tracing::error!(order_id = %record.order_id, error = %e, "Failed to persist payment");
            PaymentError::persistence(e.to_string())
        })?;

        tracing::info!(
            order_id = %record.order_id,
            payment_id = %record.id,
            app_id = %record.app_id,
            amount = record.amount,
            "Payment record created"
        );

        // 4. Ask the gateway for a hosted checkout
        let request = self.checkout_request(&record, &app.name);
        let handle = match self.gateway.create_checkout(request).await {
            Ok(handle) => handle,
            Err(gateway_err) => {
                tracing::error!(
                    order_id = %record.order_id,
                    error = %gateway_err,
                    provider_code = ?gateway_err.provider_code,
                    "Gateway refused checkout creation"
                );
                record.mark_checkout_failed(gateway_err.message.clone())?;
                match self
                    .payments
                    .update_if_status(&record, PaymentStatus::Pending)
                    .await
                {
                    Ok(true) => {}
                    Ok(false) => tracing::warn!(
                        order_id = %record.order_id,
                        "Payment moved on before the checkout failure was recorded"
                    ),
                    Err(e) => tracing::error!(
                        order_id = %record.order_id,
                        error = %e,
                        "Failed to record checkout failure"
                    ),
                }
                return Err(PaymentError::upstream(
                    record.order_id.as_str(),
                    gateway_err.message,
                ));
            }
        };

        // 5. Remember the handle. The gateway already knows the order, so a
        //    failed write here is logged and the buyer can still pay. A
        //    notification that landed first keeps its status.
        record.record_checkout(handle.token.clone(), handle.redirect_url.clone(), handle.raw);
        match self
            .payments
            .update_if_status(&record, PaymentStatus::Pending)
            .await
        {
            Ok(true) => {}
            Ok(false) => tracing::warn!(
                order_id = %record.order_id,
                "Payment moved on before the checkout handle was stored"
            ),
            Err(e) => tracing::warn!(
                order_id = %record.order_id,
                error = %e,
                "Failed to store checkout handle"
            ),
        }

        Ok(CreatePaymentResult {
            order_id: record.order_id,
            payment_id: record.id,
            amount: record.amount,
            currency: record.currency,
            app_name: app.name,
            buyer_email: record.buyer_email,
            checkout_token: handle.token,
            checkout_url: handle.redirect_url,
        })
    }

    fn checkout_request(&self, record: &PaymentRecord, app_name: &str) -> CheckoutRequest {
        CheckoutRequest {
            order_id: record.order_id.to_string(),
            gross_amount: record.amount,
            currency: record.currency.clone(),
            customer: CustomerDetails {
                first_name: record.buyer_name.clone(),
                email: record.buyer_email.clone(),
            },
            item: CheckoutItem {
                id: record.app_id.to_string(),
                price: record.amount,
                quantity: 1,
                name: app_name.to_string(),
                category: "Application".to_string(),
                merchant_name: self.settings.merchant_name.clone(),
            },
            enabled_payments: self.settings.enabled_payments.clone(),
            callbacks: CheckoutCallbacks::for_order(
                &self.settings.public_base_url,
                record.order_id.as_str(),
            ),
        }
    }
}
