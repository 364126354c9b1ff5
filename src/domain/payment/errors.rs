//! Payment reconciliation error taxonomy.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | NotFound | 404 |
//! | InvalidTierPrice | 400 |
//! | GatewayUnavailable | 502 |
//! | Gateway | 502 |
//! | GrantFailed | 500 |
//! | Storage | 500 |

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

use super::SubscriptionTier;

/// Errors raised by the reconciliation engine.
///
/// Gateway failures are never swallowed by `create_payment` or
/// `check_payment`; only the webhook ingress converts errors into an
/// ignored result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaymentError {
    /// No local payment correlates with the gateway payment id.
    #[error("payment not found for gateway id {0}")]
    NotFound(String),

    /// The tier has no positive configured price and is not purchasable.
    #[error("tier {tier} has no purchasable price (configured: {price_rub} RUB)")]
    InvalidTierPrice {
        tier: SubscriptionTier,
        price_rub: i64,
    },

    /// Transport-level failure reaching the gateway (connect, timeout).
    #[error("payment gateway unreachable: {0}")]
    GatewayUnavailable(String),

    /// The gateway answered with a service error.
    #[error("payment gateway error: {message}")]
    Gateway { message: String },

    /// The subscription grant failed; the status transition was aborted
    /// and the payment remains in its pre-grant state.
    #[error("subscription grant failed: {reason}")]
    GrantFailed { reason: String },

    /// Repository failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl PaymentError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            PaymentError::NotFound(_) => ErrorCode::PaymentNotFound,
            PaymentError::InvalidTierPrice { .. } => ErrorCode::InvalidTierPrice,
            PaymentError::GatewayUnavailable(_) => ErrorCode::GatewayUnavailable,
            PaymentError::Gateway { .. } => ErrorCode::GatewayError,
            PaymentError::GrantFailed { .. } => ErrorCode::GrantFailed,
            PaymentError::Storage(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns true if a later retry may succeed without operator action.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentError::GatewayUnavailable(_)
                | PaymentError::Gateway { .. }
                | PaymentError::GrantFailed { .. }
                | PaymentError::Storage(_)
        )
    }
}

impl From<DomainError> for PaymentError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::PaymentNotFound => PaymentError::NotFound(err.message),
            ErrorCode::GrantFailed | ErrorCode::UserNotFound => PaymentError::GrantFailed {
                reason: err.message,
            },
            _ => PaymentError::Storage(err.message),
        }
    }
}
