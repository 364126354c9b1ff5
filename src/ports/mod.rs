//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the reconciliation engine and the outside world. Adapters implement
//! these ports.
//!
//! - `PaymentGateway` - remote payment intent creation and lookup
//! - `PaymentRepository` / `PaymentUpdateGuard` - transactional payment
//!   store with per-payment serialized updates
//! - `SubscriptionGrantor` - applies a tier upgrade for a fixed duration

mod gateway;
mod repository;
mod grantor;

pub use gateway::{
    CreateIntentRequest, GatewayError, GatewayIntent, IntentMetadata, PaymentGateway,
};
pub use grantor::SubscriptionGrantor;
pub use repository::{PaymentRepository, PaymentUpdateGuard};
