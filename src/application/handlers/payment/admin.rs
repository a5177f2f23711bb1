//! Operator privilege guard.

use crate::domain::foundation::UserId;
use crate::domain::payment::PaymentError;
use crate::ports::AdminDirectory;

/// Fails with `Forbidden` unless `user_id` is an operator.
pub(crate) async fn ensure_admin(
    admins: &dyn AdminDirectory,
    user_id: &UserId,
) -> Result<(), PaymentError> {
    if admins.is_admin(user_id).await? {
        Ok(())
    } else {
        tracing::warn!(user_id = %user_id, "Non-admin attempted an admin operation");
        Err(PaymentError::forbidden("Forbidden: Admin only"))
    }
}
