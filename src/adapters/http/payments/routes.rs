//! Axum router configuration for payment endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{check_payment, create_payment, handle_gateway_webhook, PaymentsAppState};

/// Create the payments API router.
///
/// # Routes
///
/// - `POST /` - Create a payment intent for a tier purchase
/// - `GET /:gateway_payment_id` - Reconcile and return a payment
pub fn payment_routes() -> Router<PaymentsAppState> {
    Router::new()
        .route("/", post(create_payment))
        .route("/:gateway_payment_id", get(check_payment))
}

/// Create the gateway webhook router.
///
/// Separate from the payment routes because webhooks carry no user
/// authentication; authenticity is the payload signature.
///
/// # Routes
/// - `POST /yookassa` - Handle gateway webhook notifications
pub fn webhook_routes() -> Router<PaymentsAppState> {
    Router::new().route("/yookassa", post(handle_gateway_webhook))
}

/// Create the complete payments module router.
///
/// Combines payment routes and webhook routes into a single router
/// suitable for mounting at `/api`.
pub fn payments_router() -> Router<PaymentsAppState> {
    Router::new()
        .nest("/payments", payment_routes())
        .nest("/webhooks", webhook_routes())
}
