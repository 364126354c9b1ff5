//! Payment status and the gateway status mapper.
//!
//! The gateway reports status as a free-form string. This module closes
//! that open set into the domain enumeration with an explicit fail-safe:
//! anything unrecognized is treated as still pending, never as success or
//! cancellation.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a payment.
///
/// Transitions are driven only by freshly fetched gateway records.
/// `Succeeded` and `Canceled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Intent created, payer has not completed confirmation.
    Pending,

    /// Payer authorized the payment; capture has not settled yet.
    WaitingForCapture,

    /// Payment settled. Terminal; the subscription grant fires on the
    /// first transition into this state.
    Succeeded,

    /// Payment canceled by the payer, the gateway, or expiry. Terminal.
    Canceled,
}

impl PaymentStatus {
    /// Maps a raw gateway status string into the closed domain set.
    ///
    /// Total over all inputs: the known literals map directly, anything
    /// else falls back to `Pending` so an unknown remote state can never
    /// be read as success or cancellation.
    pub fn from_gateway(raw: &str) -> Self {
        match raw {
            "pending" => PaymentStatus::Pending,
            "waiting_for_capture" => PaymentStatus::WaitingForCapture,
            "succeeded" => PaymentStatus::Succeeded,
            "canceled" => PaymentStatus::Canceled,
            _ => PaymentStatus::Pending,
        }
    }

    /// Returns true for the terminal success state.
    pub fn is_succeeded(&self) -> bool {
        matches!(self, PaymentStatus::Succeeded)
    }

    /// Returns true for either terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Succeeded | PaymentStatus::Canceled)
    }

    /// Returns the canonical wire string for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::WaitingForCapture => "waiting_for_capture",
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
