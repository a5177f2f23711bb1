//! Payment-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | Validation | 400 |
//! | InvalidState | 400 |
//! | Authentication | 403 |
//! | Forbidden | 403 |
//! | NotFound | 404 |
//! | Upstream | 500 |
//! | Persistence | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

/// Errors surfaced by payment operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// Bad or missing input.
    Validation { field: String, message: String },

    /// Unknown app or order.
    NotFound(String),

    /// Request is well formed but the target is in the wrong state.
    InvalidState(String),

    /// Gateway notification signature did not match.
    Authentication(String),

    /// Caller is authenticated but not allowed to do this.
    Forbidden(String),

    /// The gateway refused or could not be reached.
    Upstream { order_id: String, message: String },

    /// Storage read or write failed.
    Persistence(String),
}

impl PaymentError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        PaymentError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        PaymentError::NotFound(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        PaymentError::InvalidState(message.into())
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        PaymentError::Authentication(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        PaymentError::Forbidden(message.into())
    }

    pub fn upstream(order_id: impl Into<String>, message: impl Into<String>) -> Self {
        PaymentError::Upstream {
            order_id: order_id.into(),
            message: message.into(),
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        PaymentError::Persistence(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            PaymentError::Validation { .. } => ErrorCode::ValidationFailed,
            PaymentError::NotFound(_) => ErrorCode::PaymentNotFound,
            PaymentError::InvalidState(_) => ErrorCode::InvalidStateTransition,
            PaymentError::Authentication(_) => ErrorCode::InvalidSignature,
            PaymentError::Forbidden(_) => ErrorCode::Forbidden,
            PaymentError::Upstream { .. } => ErrorCode::GatewayError,
            PaymentError::Persistence(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a caller-safe error message.
    pub fn message(&self) -> String {
        match self {
            PaymentError::Validation { message, .. } => message.clone(),
            PaymentError::NotFound(msg)
            | PaymentError::InvalidState(msg)
            | PaymentError::Authentication(msg)
            | PaymentError::Forbidden(msg) => msg.clone(),
            PaymentError::Upstream { .. } => "Failed to create payment".to_string(),
            PaymentError::Persistence(_) => "Internal server error".to_string(),
        }
    }

    /// Returns true if the same request may succeed later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentError::Upstream { .. } | PaymentError::Persistence(_)
        )
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentError::Validation { field, message } => {
                write!(f, "Validation failed for '{}': {}", field, message)
            }
            PaymentError::Upstream { order_id, message } => {
                write!(f, "Gateway error for {}: {}", order_id, message)
            }
            PaymentError::Persistence(msg) => write!(f, "Persistence error: {}", msg),
            other => write!(f, "{}", other.message()),
        }
    }
}

impl std::error::Error for PaymentError {}

impl From<ValidationError> for PaymentError {
    fn from(err: ValidationError) -> Self {
        let field = err.field().to_string();
        let message = match &err {
            ValidationError::EmptyField { field } => format!("Missing required field: {}", field),
            ValidationError::InvalidFormat { reason, .. } => reason.clone(),
            ValidationError::OutOfRange { .. } => err.to_string(),
        };
        PaymentError::Validation { field, message }
    }
}

impl From<DomainError> for PaymentError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed | ErrorCode::EmptyField | ErrorCode::InvalidFormat => {
                PaymentError::Validation {
                    field: err
                        .details
                        .get("field")
                        .cloned()
                        .unwrap_or_else(|| "unknown".to_string()),
                    message: err.message,
                }
            }
            ErrorCode::PaymentNotFound | ErrorCode::AppNotFound => PaymentError::NotFound(err.message),
            ErrorCode::InvalidStateTransition | ErrorCode::AppNotForSale => {
                PaymentError::InvalidState(err.message)
            }
            ErrorCode::InvalidSignature => PaymentError::Authentication(err.message),
            ErrorCode::Unauthorized | ErrorCode::Forbidden => PaymentError::Forbidden(err.message),
            ErrorCode::GatewayError => PaymentError::Upstream {
                order_id: err.details.get("order_id").cloned().unwrap_or_default(),
                message: err.message,
            },
            _ => PaymentError::Persistence(err.to_string()),
        }
    }
}

impl From<PaymentError> for DomainError {
    fn from(err: PaymentError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_from_empty_field_names_field() {
        let err: PaymentError = ValidationError::empty_field("buyer_email").into();
        assert_eq!(
            err,
            PaymentError::validation("buyer_email", "Missing required field: buyer_email")
        );
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
    }

    #[test]
    fn upstream_message_hides_gateway_detail() {
        let err = PaymentError::upstream("ORDER-1-ABC", "401 Unauthorized: bad server key");
        assert_eq!(err.message(), "Failed to create payment");
        assert!(err.to_string().contains("ORDER-1-ABC"));
        assert!(err.is_retryable());
    }

    #[test]
    fn persistence_message_is_generic() {
        let err = PaymentError::persistence("connection reset by peer");
        assert_eq!(err.message(), "Internal server error");
        assert!(err.is_retryable());
    }

    #[test]
    fn client_errors_are_not_retryable() {
        assert!(!PaymentError::authentication("Invalid signature").is_retryable());
        assert!(!PaymentError::not_found("Payment not found").is_retryable());
        assert!(!PaymentError::validation("app_id", "missing").is_retryable());
    }

    #[test]
    fn domain_not_found_maps_to_not_found() {
        let err: PaymentError =
            DomainError::new(ErrorCode::AppNotFound, "App not found").into();
        assert_eq!(err, PaymentError::not_found("App not found"));
    }

    #[test]
    fn domain_database_error_maps_to_persistence() {
        let err: PaymentError = DomainError::database("pool timed out").into();
        assert!(matches!(err, PaymentError::Persistence(_)));
    }

    #[test]
    fn domain_gateway_error_keeps_order_id() {
        let err: PaymentError = DomainError::new(ErrorCode::GatewayError, "timeout")
            .with_detail("order_id", "ORDER-9-X")
            .into();
        assert_eq!(err, PaymentError::upstream("ORDER-9-X", "timeout"));
    }
}
