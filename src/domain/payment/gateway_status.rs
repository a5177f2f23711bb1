//! Gateway status vocabulary and its mapping onto [`PaymentStatus`].

use super::PaymentStatus;

/// `transaction_status` values a notification can carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    Capture,
    Settlement,
    Pending,
    Deny,
    Expire,
    Cancel,
    /// Anything else (refund, partial_refund, authorize, ...).
    Other(String),
}

impl TransactionStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "capture" => TransactionStatus::Capture,
            "settlement" => TransactionStatus::Settlement,
            "pending" => TransactionStatus::Pending,
            "deny" => TransactionStatus::Deny,
            "expire" => TransactionStatus::Expire,
            "cancel" => TransactionStatus::Cancel,
            other => TransactionStatus::Other(other.to_string()),
        }
    }
}

/// `fraud_status` values, only meaningful alongside `capture`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FraudStatus {
    Accept,
    Challenge,
    Deny,
    Other(String),
}

impl FraudStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "accept" => FraudStatus::Accept,
            "challenge" => FraudStatus::Challenge,
            "deny" => FraudStatus::Deny,
            other => FraudStatus::Other(other.to_string()),
        }
    }
}

/// Maps a gateway status pair to the internal status it implies.
///
/// `None` means the pair carries no information we act on and the
/// record keeps whatever status it already has.
pub fn map_gateway_status(
    transaction: &TransactionStatus,
    fraud: Option<&FraudStatus>,
) -> Option<PaymentStatus> {
    match (transaction, fraud) {
        (TransactionStatus::Settlement, _) => Some(PaymentStatus::Verified),
        (TransactionStatus::Capture, Some(FraudStatus::Accept)) => Some(PaymentStatus::Verified),
        (TransactionStatus::Capture, Some(FraudStatus::Challenge)) => Some(PaymentStatus::Pending),
        (TransactionStatus::Capture, _) => None,
        (TransactionStatus::Pending, _) => Some(PaymentStatus::Pending),
        (TransactionStatus::Deny | TransactionStatus::Expire | TransactionStatus::Cancel, _) => {
            Some(PaymentStatus::Failed)
        }
        (TransactionStatus::Other(_), _) => None,
    }
}

/// Convenience wrapper over raw strings as they arrive on the wire.
pub fn map_raw_gateway_status(transaction: &str, fraud: Option<&str>) -> Option<PaymentStatus> {
    let fraud = fraud
        .filter(|f| !f.trim().is_empty())
        .map(FraudStatus::parse);
    map_gateway_status(&TransactionStatus::parse(transaction), fraud.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn settlement_verifies() {
        assert_eq!(
            map_raw_gateway_status("settlement", None),
            Some(PaymentStatus::Verified)
        );
    }

    #[test]
    fn capture_depends_on_fraud_verdict() {
        assert_eq!(
            map_raw_gateway_status("capture", Some("accept")),
            Some(PaymentStatus::Verified)
        );
        assert_eq!(
            map_raw_gateway_status("capture", Some("challenge")),
            Some(PaymentStatus::Pending)
        );
        assert_eq!(map_raw_gateway_status("capture", None), None);
        assert_eq!(map_raw_gateway_status("capture", Some("")), None);
        assert_eq!(map_raw_gateway_status("capture", Some("deny")), None);
    }

    #[test]
    fn terminal_gateway_statuses_fail() {
        for status in ["deny", "expire", "cancel"] {
            assert_eq!(
                map_raw_gateway_status(status, None),
                Some(PaymentStatus::Failed),
                "{}",
                status
            );
        }
    }

    #[test]
    fn matching_ignores_case_and_padding() {
        assert_eq!(
            map_raw_gateway_status(" Settlement ", None),
            Some(PaymentStatus::Verified)
        );
        assert_eq!(
            map_raw_gateway_status("CAPTURE", Some("Accept")),
            Some(PaymentStatus::Verified)
        );
    }

    #[test]
    fn refund_and_authorize_are_not_mapped() {
        assert_eq!(map_raw_gateway_status("refund", None), None);
        assert_eq!(map_raw_gateway_status("authorize", None), None);
    }

    proptest! {
        #[test]
        fn settlement_verifies_whatever_the_fraud_status(fraud in "[a-z]{0,12}") {
            prop_assert_eq!(
                map_raw_gateway_status("settlement", Some(&fraud)),
                Some(PaymentStatus::Verified)
            );
        }

        #[test]
        fn unknown_transaction_status_is_never_mapped(
            status in "[a-z_]{1,16}",
            fraud in proptest::option::of("[a-z]{1,10}"),
        ) {
            let known = ["capture", "settlement", "pending", "deny", "expire", "cancel"];
            prop_assume!(!known.contains(&status.as_str()));
            prop_assert_eq!(map_raw_gateway_status(&status, fraud.as_deref()), None);
        }
    }
}
