//! Request/response DTOs for the payments HTTP surface.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::payment::{Payment, PaymentStatus, SubscriptionTier};

/// Request body for `POST /api/payments`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentRequest {
    pub user_id: UserId,
    pub tier: SubscriptionTier,
}

/// Payment representation returned to API clients.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub gateway_payment_id: String,
    pub user_id: UserId,
    pub tier: SubscriptionTier,
    pub amount_minor_units: i64,
    pub status: PaymentStatus,
    pub confirmation_url: Option<String>,
    pub error_message: Option<String>,
    pub processed_at: Option<Timestamp>,
    pub description: String,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id.to_string(),
            gateway_payment_id: payment.gateway_payment_id,
            user_id: payment.user_id,
            tier: payment.tier,
            amount_minor_units: payment.amount_minor_units,
            status: payment.status,
            confirmation_url: payment.confirmation_url,
            error_message: payment.error_message,
            processed_at: payment.processed_at,
            description: payment.description,
        }
    }
}

/// Response body for the webhook endpoint.
///
/// Both processed and ignored deliveries answer 200 so the gateway's
/// retry machinery is never triggered by deliveries we chose to ignore.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
}

impl WebhookResponse {
    pub fn processed() -> Self {
        Self {
            status: "processed",
        }
    }

    pub fn ignored() -> Self {
        Self { status: "ignored" }
    }
}

/// Standard error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
