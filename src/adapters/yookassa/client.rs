//! YooKassa HTTP client.
//!
//! Talks to the YooKassa v3 payments API with HTTP Basic auth
//! (shop id / secret key) and per-request idempotence keys. Credentials
//! arrive as an explicit configuration value at construction.
//!
//! Failure mapping: transport errors (connect, timeout) become
//! `GatewayError::Unavailable`, HTTP error statuses become
//! `GatewayError::Service`, undecodable bodies become
//! `GatewayError::InvalidResponse`. No retries here; the caller owns
//! retry policy.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::config::GatewayConfig;
use crate::ports::{CreateIntentRequest, GatewayError, GatewayIntent, PaymentGateway};

use super::dto::{Amount, Confirmation, PaymentMetadata, PaymentRequest, PaymentResponse};

const IDEMPOTENCE_KEY_HEADER: &str = "Idempotence-Key";

/// YooKassa v3 API client.
pub struct YooKassaClient {
    http: reqwest::Client,
    shop_id: String,
    secret_key: SecretString,
    base_url: String,
}

impl YooKassaClient {
    /// Creates a client from gateway configuration.
    ///
    /// The request timeout bounds every remote call; a timeout surfaces
    /// as `GatewayError::Unavailable` with no local side effects.
    pub fn new(config: &GatewayConfig, request_timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            http,
            shop_id: config.shop_id.clone(),
            secret_key: config.secret_key.clone(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn decode(response: reqwest::Response) -> Result<GatewayIntent, GatewayError> {
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let payment: PaymentResponse = response
            .json()
            .await
            .map_err(|err| GatewayError::InvalidResponse(err.to_string()))?;
        Ok(into_intent(payment))
    }
}

fn into_intent(payment: PaymentResponse) -> GatewayIntent {
    GatewayIntent {
        id: payment.id,
        status: payment.status,
        confirmation_url: payment
            .confirmation
            .and_then(|confirmation| confirmation.confirmation_url),
        amount_minor_units: payment
            .amount
            .and_then(|amount| amount.to_minor_units().ok()),
        cancellation_reason: payment
            .cancellation_details
            .and_then(|details| details.reason),
    }
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    GatewayError::Unavailable(err.to_string())
}

#[async_trait]
impl PaymentGateway for YooKassaClient {
    async fn create_intent(
        &self,
        request: CreateIntentRequest,
    ) -> Result<GatewayIntent, GatewayError> {
        let body = PaymentRequest {
            amount: Amount::from_minor_units(request.amount_minor_units, &request.currency),
            capture: true,
            confirmation: Confirmation::redirect(&request.return_url),
            description: request.description,
            metadata: PaymentMetadata {
                user_id: request.metadata.user_id.to_string(),
                tier: request.metadata.tier.as_str().to_string(),
            },
        };

        let response = self
            .http
            .post(format!("{}/payments", self.base_url))
            .basic_auth(&self.shop_id, Some(self.secret_key.expose_secret()))
            .header(IDEMPOTENCE_KEY_HEADER, request.idempotence_key.to_string())
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        Self::decode(response).await
    }

    async fn find_intent(&self, gateway_payment_id: &str) -> Result<GatewayIntent, GatewayError> {
        let response = self
            .http
            .get(format!("{}/payments/{}", self.base_url, gateway_payment_id))
            .basic_auth(&self.shop_id, Some(self.secret_key.expose_secret()))
            .send()
            .await
            .map_err(transport_error)?;

        Self::decode(response).await
    }
}
