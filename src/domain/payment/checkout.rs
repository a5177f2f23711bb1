//! Purchase request validation and the catalogue view of an app.

use crate::domain::foundation::{AppId, ValidationError};

use super::PaymentError;

/// Currency used when an app row does not name one.
pub const DEFAULT_CURRENCY: &str = "IDR";

/// Catalogue data needed to sell an app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppListing {
    pub id: AppId,
    pub name: String,
    /// Price in whole currency units.
    pub price: i64,
    pub currency: Option<String>,
    pub is_paid: bool,
}

impl AppListing {
    /// Fails unless the app can be bought.
    pub fn ensure_purchasable(&self) -> Result<(), PaymentError> {
        if !self.is_paid {
            return Err(PaymentError::invalid_state("This app is free"));
        }
        if self.price <= 0 {
            return Err(PaymentError::invalid_state("This app has no price set"));
        }
        Ok(())
    }

    pub fn currency_or_default(&self) -> String {
        self.currency
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CURRENCY)
            .to_string()
    }
}

/// Validated buyer-supplied fields of a purchase request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyerDetails {
    pub name: String,
    pub email: String,
    pub payment_method: String,
}

impl BuyerDetails {
    /// Trims and validates the raw request fields.
    pub fn parse(
        name: &str,
        email: &str,
        payment_method: &str,
    ) -> Result<Self, ValidationError> {
        let name = required("buyer_name", name)?;
        let email = required("buyer_email", email)?;
        let payment_method = required("payment_method", payment_method)?;

        if !is_email_shaped(&email) {
            return Err(ValidationError::invalid_format(
                "buyer_email",
                "Invalid email format",
            ));
        }

        Ok(Self {
            name,
            email,
            payment_method,
        })
    }
}

/// Parses the `app_id` field of a purchase request.
pub fn parse_app_id(raw: &str) -> Result<AppId, ValidationError> {
    let raw = required("app_id", raw)?;
    raw.parse()
        .map_err(|_| ValidationError::invalid_format("app_id", "must be a UUID"))
}

fn required(field: &str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::empty_field(field));
    }
    Ok(value.to_string())
}

/// `local@domain.tld` with no whitespace and exactly one `@`.
fn is_email_shaped(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}
