//! Payment aggregate - the reconciliation unit.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PaymentId, Timestamp, UserId};

use super::{PaymentStatus, SubscriptionTier};

/// A payment intent tracked against the gateway.
///
/// `gateway_payment_id` is the sole correlation key between the local
/// record and the remote intent; it is assigned by the gateway at creation
/// and never changes. `amount_minor_units` is derived from tier pricing at
/// creation and never recomputed from gateway responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub gateway_payment_id: String,
    pub user_id: UserId,
    pub tier: SubscriptionTier,
    /// Amount in the currency's smallest unit (kopecks).
    pub amount_minor_units: i64,
    pub status: PaymentStatus,
    pub confirmation_url: Option<String>,
    pub error_message: Option<String>,
    /// Set on every reconciliation pass that yields a gateway-confirmed read.
    pub processed_at: Option<Timestamp>,
    pub description: String,
    pub created_at: Timestamp,
}

impl Payment {
    /// Creates a new local payment record from a freshly created gateway
    /// intent.
    pub fn new(
        gateway_payment_id: impl Into<String>,
        user_id: UserId,
        tier: SubscriptionTier,
        amount_minor_units: i64,
        status: PaymentStatus,
        confirmation_url: Option<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            gateway_payment_id: gateway_payment_id.into(),
            user_id,
            tier,
            amount_minor_units,
            status,
            confirmation_url,
            error_message: None,
            processed_at: None,
            description: description.into(),
            created_at: Timestamp::now(),
        }
    }

    /// Builds the payer-facing description for a purchase.
    pub fn describe(tier: SubscriptionTier, user_id: &UserId) -> String {
        format!("{} subscription for user {}", tier.display_name(), user_id)
    }

    /// Records the outcome of a gateway-confirmed read.
    ///
    /// Updates status, `processed_at`, and the cancellation reason even
    /// when the mapped status is unchanged, so the record always reflects
    /// the latest confirmed state.
    pub fn record_gateway_state(
        &mut self,
        status: PaymentStatus,
        cancellation_reason: Option<String>,
        now: Timestamp,
    ) {
        self.status = status;
        self.processed_at = Some(now);
        self.error_message = cancellation_reason;
    }

    /// Returns true once the payment has reached the terminal success
    /// state and must never be re-queried or re-granted.
    pub fn is_settled(&self) -> bool {
        self.status.is_succeeded()
    }
}
