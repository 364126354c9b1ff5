//! Payment repository port.
//!
//! The store must support serialized per-payment updates: the engine's
//! succeeded-no-op check, the subscription grant, and the status commit
//! form one logical unit that concurrent reconciliations of the same
//! payment must not interleave. `lock_for_update` expresses this as a
//! guard (row lock in Postgres, per-key mutex in memory); the remote
//! gateway call always happens before the guard is taken, so no lock is
//! ever held across network I/O to the gateway.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::payment::Payment;

/// Port for the transactional payment store.
///
/// Lookup is by `gateway_payment_id`, the sole correlation key between
/// local and remote records; implementations must index it.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Persists a freshly created payment.
    async fn insert(&self, payment: &Payment) -> Result<(), DomainError>;

    /// Finds a payment by its gateway-assigned id. Plain read, no lock.
    async fn find_by_gateway_id(
        &self,
        gateway_payment_id: &str,
    ) -> Result<Option<Payment>, DomainError>;

    /// Opens a serialized update scope for one payment.
    ///
    /// Concurrent calls for the same payment block until the current
    /// holder commits or drops its guard. Returns `None` when no payment
    /// correlates with the id.
    async fn lock_for_update(
        &self,
        gateway_payment_id: &str,
    ) -> Result<Option<Box<dyn PaymentUpdateGuard>>, DomainError>;
}

/// Exclusive handle on a single payment row.
///
/// `payment()` exposes the state as of lock acquisition; callers must
/// re-run their no-op checks against it rather than against any earlier
/// read. Dropping the guard without committing rolls the scope back.
#[async_trait]
pub trait PaymentUpdateGuard: Send {
    /// The payment as read under the lock.
    fn payment(&self) -> &Payment;

    /// Writes the updated payment and releases the lock.
    async fn commit(self: Box<Self>, payment: Payment) -> Result<Payment, DomainError>;
}
