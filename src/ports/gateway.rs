//! Payment gateway port.
//!
//! The gateway is a remote RPC boundary: both calls are synchronous
//! network operations that may fail with a transport or service error.
//! The engine treats any such failure as opaque and non-retryable at this
//! layer; retry policy belongs to the caller (or to the gateway's own
//! webhook redelivery).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::foundation::UserId;
use crate::domain::payment::SubscriptionTier;

/// Port for the remote payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a payment intent on the remote service.
    ///
    /// The idempotence key makes the remote call safe against transport
    /// retries; the engine generates a fresh key per creation attempt.
    async fn create_intent(
        &self,
        request: CreateIntentRequest,
    ) -> Result<GatewayIntent, GatewayError>;

    /// Fetches the current state of a payment intent by gateway id.
    async fn find_intent(&self, gateway_payment_id: &str) -> Result<GatewayIntent, GatewayError>;
}

/// Request to create a payment intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIntentRequest {
    /// Amount in the currency's smallest unit (kopecks).
    pub amount_minor_units: i64,

    /// ISO currency code.
    pub currency: String,

    /// Payer redirect target after confirmation.
    pub return_url: String,

    /// Human-readable purchase description.
    pub description: String,

    /// Correlation metadata stored with the remote intent.
    pub metadata: IntentMetadata,

    /// Fresh idempotence key for this creation attempt.
    pub idempotence_key: Uuid,
}

/// Metadata attached to the remote intent for correlation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentMetadata {
    pub user_id: UserId,
    pub tier: SubscriptionTier,
}

/// A payment intent as reported by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayIntent {
    /// Gateway-assigned payment id.
    pub id: String,

    /// Raw gateway status string; mapped into the domain set by the
    /// status mapper, never consumed directly.
    pub status: String,

    /// Payer-facing confirmation link (present on freshly created intents).
    pub confirmation_url: Option<String>,

    /// Amount echoed by the gateway, in minor units. Informational only:
    /// local pricing is never recomputed from it.
    pub amount_minor_units: Option<i64>,

    /// Cancellation reason, when the intent was canceled.
    pub cancellation_reason: Option<String>,
}

/// Errors from gateway operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The service could not be reached (connect failure, timeout).
    #[error("gateway unreachable: {0}")]
    Unavailable(String),

    /// The service answered with an error status.
    #[error("gateway rejected request ({status}): {message}")]
    Service { status: u16, message: String },

    /// The service answered with a body we could not decode.
    #[error("gateway response invalid: {0}")]
    InvalidResponse(String),
}
