//! Subscription grantor port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::payment::SubscriptionTier;

/// Port for applying a subscription tier upgrade.
///
/// Implementations are NOT assumed idempotent: the engine's exactly-once
/// transition guard is the sole protection against double-granting, so a
/// grant must only ever be invoked on the first transition of a payment
/// into the terminal success state.
#[async_trait]
pub trait SubscriptionGrantor: Send + Sync {
    /// Upgrades the user to the tier for the given number of days,
    /// extending any entitlement that is still running.
    async fn grant(
        &self,
        user_id: &UserId,
        tier: SubscriptionTier,
        duration_days: i64,
    ) -> Result<(), DomainError>;
}
