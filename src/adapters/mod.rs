//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the reconciliation engine to external systems:
//! - `yookassa` - Gateway client over the YooKassa v3 REST API
//! - `postgres` - Payment store and subscription grantor backed by sqlx
//! - `memory` - In-memory payment store for tests and local development
//! - `http` - Axum routes exposing payments and the webhook ingress

pub mod http;
pub mod memory;
pub mod postgres;
pub mod yookassa;
