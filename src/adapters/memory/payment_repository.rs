//! In-memory implementation of PaymentRepository.
//!
//! Mirrors the Postgres adapter's locking contract with a per-payment
//! async mutex: concurrent `lock_for_update` calls for the same gateway
//! payment id serialize, and the guard re-reads the record after the lock
//! is acquired so holders always see the latest committed state.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::payment::Payment;
use crate::ports::{PaymentRepository, PaymentUpdateGuard};

type PaymentMap = Arc<RwLock<HashMap<String, Payment>>>;

/// In-memory payment store keyed by gateway payment id.
#[derive(Clone, Default)]
pub struct InMemoryPaymentRepository {
    payments: PaymentMap,
    row_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl InMemoryPaymentRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored payments (test helper).
    pub async fn len(&self) -> usize {
        self.payments.read().await.len()
    }

    /// True when no payments are stored (test helper).
    pub async fn is_empty(&self) -> bool {
        self.payments.read().await.is_empty()
    }

    async fn row_lock(&self, gateway_payment_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.row_locks.lock().await;
        locks
            .entry(gateway_payment_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn insert(&self, payment: &Payment) -> Result<(), DomainError> {
        let mut payments = self.payments.write().await;
        if payments.contains_key(&payment.gateway_payment_id) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                format!(
                    "duplicate gateway payment id {}",
                    payment.gateway_payment_id
                ),
            ));
        }
        payments.insert(payment.gateway_payment_id.clone(), payment.clone());
        Ok(())
    }

    async fn find_by_gateway_id(
        &self,
        gateway_payment_id: &str,
    ) -> Result<Option<Payment>, DomainError> {
        Ok(self.payments.read().await.get(gateway_payment_id).cloned())
    }

    async fn lock_for_update(
        &self,
        gateway_payment_id: &str,
    ) -> Result<Option<Box<dyn PaymentUpdateGuard>>, DomainError> {
        let row_lock = self.row_lock(gateway_payment_id).await;
        let permit = row_lock.lock_owned().await;

        // Read under the lock so the holder sees the latest commit.
        let Some(payment) = self.payments.read().await.get(gateway_payment_id).cloned() else {
            return Ok(None);
        };

        Ok(Some(Box::new(InMemoryUpdateGuard {
            payment,
            payments: self.payments.clone(),
            _permit: permit,
        })))
    }
}

struct InMemoryUpdateGuard {
    payment: Payment,
    payments: PaymentMap,
    _permit: OwnedMutexGuard<()>,
}

#[async_trait]
impl PaymentUpdateGuard for InMemoryUpdateGuard {
    fn payment(&self) -> &Payment {
        &self.payment
    }

    async fn commit(self: Box<Self>, payment: Payment) -> Result<Payment, DomainError> {
        let mut payments = self.payments.write().await;
        payments.insert(payment.gateway_payment_id.clone(), payment.clone());
        Ok(payment)
    }
}
