//! Wire types for the YooKassa v3 payments API.
//!
//! Amounts cross the wire as decimal strings ("500.00"); they are
//! converted to and from integer minor units (kopecks) at this boundary
//! so the domain never handles floating point money.

use serde::{Deserialize, Serialize};

/// Monetary amount as the gateway represents it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    /// Decimal string, two fractional digits ("500.00").
    pub value: String,
    /// ISO currency code ("RUB").
    pub currency: String,
}

impl Amount {
    /// Builds a wire amount from integer minor units.
    pub fn from_minor_units(minor_units: i64, currency: &str) -> Self {
        let sign = if minor_units < 0 { "-" } else { "" };
        let abs = minor_units.unsigned_abs();
        Self {
            value: format!("{}{}.{:02}", sign, abs / 100, abs % 100),
            currency: currency.to_string(),
        }
    }

    /// Parses the wire value back into minor units.
    ///
    /// Accepts "500", "500.5", and "500.00" forms.
    pub fn to_minor_units(&self) -> Result<i64, std::num::ParseIntError> {
        let value = self.value.trim();
        let (sign, value) = match value.strip_prefix('-') {
            Some(rest) => (-1, rest),
            None => (1, value),
        };
        let (whole, frac) = match value.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (value, ""),
        };
        let whole: i64 = whole.parse()?;
        let frac: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>()? * 10,
            _ => frac.get(..2).unwrap_or(frac).parse()?,
        };
        Ok(sign * (whole * 100 + frac))
    }
}

/// Confirmation block: redirect request outbound, confirmation URL inbound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Confirmation {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_url: Option<String>,
}

impl Confirmation {
    /// Redirect confirmation pointing back at our return URL.
    pub fn redirect(return_url: &str) -> Self {
        Self {
            kind: "redirect".to_string(),
            return_url: Some(return_url.to_string()),
            confirmation_url: None,
        }
    }
}

/// Correlation metadata stored with the remote intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMetadata {
    pub user_id: String,
    pub tier: String,
}

/// Request body for `POST /payments`.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequest {
    pub amount: Amount,
    pub capture: bool,
    pub confirmation: Confirmation,
    pub description: String,
    pub metadata: PaymentMetadata,
}

/// Cancellation details on a canceled payment.
#[derive(Debug, Clone, Deserialize)]
pub struct CancellationDetails {
    #[allow(dead_code)]
    pub party: Option<String>,
    pub reason: Option<String>,
}

/// Response body for payment creation and lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentResponse {
    pub id: String,
    pub status: String,
    pub amount: Option<Amount>,
    pub confirmation: Option<Confirmation>,
    pub cancellation_details: Option<CancellationDetails>,
}
