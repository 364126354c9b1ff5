//! PostgreSQL implementation of PaymentRepository.
//!
//! `lock_for_update` opens a transaction and takes a row lock
//! (`SELECT ... FOR UPDATE`) on the payment, so concurrent
//! reconciliations of the same payment serialize on the database row.
//! The guard commits the update inside that transaction; dropping it
//! rolls back. Cross-payment operations never contend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, PaymentId, Timestamp, UserId};
use crate::domain::payment::{Payment, PaymentStatus, SubscriptionTier};
use crate::ports::{PaymentRepository, PaymentUpdateGuard};

/// PostgreSQL implementation of the PaymentRepository port.
///
/// Uses sqlx for type-safe database operations with connection pooling.
pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    /// Creates a new repository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a payment.
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    gateway_payment_id: String,
    user_id: Uuid,
    tier: String,
    amount_minor_units: i64,
    status: String,
    confirmation_url: Option<String>,
    error_message: Option<String>,
    processed_at: Option<DateTime<Utc>>,
    description: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: PaymentId::from_uuid(row.id),
            gateway_payment_id: row.gateway_payment_id,
            user_id: UserId::from_uuid(row.user_id),
            tier: parse_tier(&row.tier)?,
            amount_minor_units: row.amount_minor_units,
            status: parse_status(&row.status)?,
            confirmation_url: row.confirmation_url,
            error_message: row.error_message,
            processed_at: row.processed_at.map(Timestamp::from_datetime),
            description: row.description,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

fn parse_tier(s: &str) -> Result<SubscriptionTier, DomainError> {
    match s {
        "free" => Ok(SubscriptionTier::Free),
        "pro" => Ok(SubscriptionTier::Pro),
        "ultra" => Ok(SubscriptionTier::Ultra),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid tier value: {}", s),
        )),
    }
}

fn parse_status(s: &str) -> Result<PaymentStatus, DomainError> {
    match s {
        "pending" => Ok(PaymentStatus::Pending),
        "waiting_for_capture" => Ok(PaymentStatus::WaitingForCapture),
        "succeeded" => Ok(PaymentStatus::Succeeded),
        "canceled" => Ok(PaymentStatus::Canceled),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid status value: {}", s),
        )),
    }
}

const SELECT_COLUMNS: &str = "id, gateway_payment_id, user_id, tier, amount_minor_units, \
     status, confirmation_url, error_message, processed_at, description, created_at";

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn insert(&self, payment: &Payment) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, gateway_payment_id, user_id, tier, amount_minor_units,
                status, confirmation_url, error_message, processed_at, description, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(&payment.gateway_payment_id)
        .bind(payment.user_id.as_uuid())
        .bind(payment.tier.as_str())
        .bind(payment.amount_minor_units)
        .bind(payment.status.as_str())
        .bind(&payment.confirmation_url)
        .bind(&payment.error_message)
        .bind(payment.processed_at.map(|ts| *ts.as_datetime()))
        .bind(&payment.description)
        .bind(payment.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("payments_gateway_payment_id_key") {
                    return DomainError::new(
                        ErrorCode::DatabaseError,
                        format!(
                            "duplicate gateway payment id {}",
                            payment.gateway_payment_id
                        ),
                    );
                }
            }
            DomainError::database(format!("Failed to insert payment: {}", e))
        })?;

        Ok(())
    }

    async fn find_by_gateway_id(
        &self,
        gateway_payment_id: &str,
    ) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE gateway_payment_id = $1",
            SELECT_COLUMNS
        ))
        .bind(gateway_payment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load payment: {}", e)))?;

        row.map(Payment::try_from).transpose()
    }

    async fn lock_for_update(
        &self,
        gateway_payment_id: &str,
    ) -> Result<Option<Box<dyn PaymentUpdateGuard>>, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database(format!("Failed to begin transaction: {}", e)))?;

        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE gateway_payment_id = $1 FOR UPDATE",
            SELECT_COLUMNS
        ))
        .bind(gateway_payment_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DomainError::database(format!("Failed to lock payment: {}", e)))?;

        let Some(row) = row else {
            // Dropping the transaction rolls back; nothing to lock.
            return Ok(None);
        };

        Ok(Some(Box::new(PostgresUpdateGuard {
            payment: Payment::try_from(row)?,
            tx,
        })))
    }
}

struct PostgresUpdateGuard {
    payment: Payment,
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl PaymentUpdateGuard for PostgresUpdateGuard {
    fn payment(&self) -> &Payment {
        &self.payment
    }

    async fn commit(self: Box<Self>, payment: Payment) -> Result<Payment, DomainError> {
        let mut tx = self.tx;

        sqlx::query(
            r#"
            UPDATE payments
            SET status = $2, error_message = $3, processed_at = $4
            WHERE id = $1
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.status.as_str())
        .bind(&payment.error_message)
        .bind(payment.processed_at.map(|ts| *ts.as_datetime()))
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update payment: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| DomainError::database(format!("Failed to commit payment update: {}", e)))?;

        Ok(payment)
    }
}
