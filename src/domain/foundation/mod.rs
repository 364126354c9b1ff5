//! Foundation - Shared value objects for the domain layer.

mod errors;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode};
pub use ids::{PaymentId, UserId};
pub use timestamp::Timestamp;
