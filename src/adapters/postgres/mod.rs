//! PostgreSQL adapters.

mod payment_repository;
mod subscription_grantor;

pub use payment_repository::PostgresPaymentRepository;
pub use subscription_grantor::PostgresSubscriptionGrantor;
