//! Gateway configuration (YooKassa)

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Gateway configuration (YooKassa)
///
/// Credentials are explicit constructor inputs to the gateway client,
/// never process-global state.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// YooKassa shop identifier
    pub shop_id: String,

    /// YooKassa API secret key
    pub secret_key: SecretString,

    /// Webhook signing secret. Optional: when absent, webhook signature
    /// verification is bypassed (development mode only).
    pub webhook_secret: Option<SecretString>,

    /// URL the payer is redirected to after confirmation
    pub return_url: String,

    /// Base URL for the gateway API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl GatewayConfig {
    /// Validate gateway configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.shop_id.is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY_SHOP_ID"));
        }
        if self.secret_key.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY_SECRET_KEY"));
        }
        if !self.api_base_url.starts_with("https://") && !self.api_base_url.starts_with("http://") {
            return Err(ValidationError::InvalidGatewayUrl);
        }
        if !self.return_url.starts_with("https://") && !self.return_url.starts_with("http://") {
            return Err(ValidationError::InvalidReturnUrl);
        }
        Ok(())
    }

    /// True when webhook signatures will actually be checked
    pub fn verifies_webhooks(&self) -> bool {
        self.webhook_secret
            .as_ref()
            .map(|s| !s.expose_secret().is_empty())
            .unwrap_or(false)
    }
}

fn default_api_base_url() -> String {
    "https://api.yookassa.ru/v3".to_string()
}
