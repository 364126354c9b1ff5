//! HTTP handlers for payment endpoints.
//!
//! These handlers connect Axum routes to the reconciliation engine.

use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::ReconciliationService;
use crate::domain::payment::PaymentError;

use super::dto::{CreatePaymentRequest, ErrorResponse, PaymentResponse, WebhookResponse};

/// Header carrying the webhook signature.
const SIGNATURE_HEADER: &str = "x-signature";

/// Shared application state for the payments surface.
#[derive(Clone)]
pub struct PaymentsAppState {
    pub service: Arc<ReconciliationService>,
}

/// POST /api/payments - Create a payment intent for a tier purchase.
pub async fn create_payment(
    State(state): State<PaymentsAppState>,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let payment = state
        .service
        .create_payment(request.user_id, request.tier)
        .await?;

    Ok((StatusCode::CREATED, Json(PaymentResponse::from(payment))))
}

/// GET /api/payments/:gateway_payment_id - Reconcile and return a payment.
pub async fn check_payment(
    State(state): State<PaymentsAppState>,
    Path(gateway_payment_id): Path<String>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let payment = state.service.check_payment(&gateway_payment_id).await?;

    Ok(Json(PaymentResponse::from(payment)))
}

/// POST /api/webhooks/yookassa - Handle gateway webhook notifications.
///
/// Always answers 200: a delivery we ignore (bad signature, missing id,
/// failed reconciliation) is reported as `ignored`, never as an error
/// the gateway would retry against.
pub async fn handle_gateway_webhook(
    State(state): State<PaymentsAppState>,
    headers: axum::http::HeaderMap,
    Json(payload): Json<serde_json::Value>,
) -> impl IntoResponse {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let response = match state.service.handle_webhook(&payload, signature).await {
        Some(_) => WebhookResponse::processed(),
        None => WebhookResponse::ignored(),
    };

    (StatusCode::OK, Json(response))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts reconciliation errors to HTTP responses.
pub struct PaymentApiError(PaymentError);

impl From<PaymentError> for PaymentApiError {
    fn from(err: PaymentError) -> Self {
        Self(err)
    }
}

impl IntoResponse for PaymentApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            PaymentError::NotFound(_) => StatusCode::NOT_FOUND,
            PaymentError::InvalidTierPrice { .. } => StatusCode::BAD_REQUEST,
            PaymentError::GatewayUnavailable(_) | PaymentError::Gateway { .. } => {
                StatusCode::BAD_GATEWAY
            }
            PaymentError::GrantFailed { .. } | PaymentError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorResponse::new(self.0.code().to_string(), self.0.to_string());
        (status, Json(body)).into_response()
    }
}
