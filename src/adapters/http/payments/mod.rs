//! HTTP surface for payments and the gateway webhook.

mod dto;
mod handlers;
mod routes;

pub use dto::{CreatePaymentRequest, ErrorResponse, PaymentResponse, WebhookResponse};
pub use handlers::PaymentsAppState;
pub use routes::{payment_routes, payments_router, webhook_routes};
