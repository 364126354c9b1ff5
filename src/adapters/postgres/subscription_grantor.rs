//! PostgreSQL implementation of SubscriptionGrantor.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::domain::payment::SubscriptionTier;
use crate::ports::SubscriptionGrantor;

/// Grants subscriptions by raising the user's tier and extending the
/// expiry in a single UPDATE.
///
/// The extension starts from whichever is later: now, or the current
/// expiry. A user whose entitlement is still running keeps the remainder;
/// a lapsed user starts a fresh period.
pub struct PostgresSubscriptionGrantor {
    pool: PgPool,
}

impl PostgresSubscriptionGrantor {
    /// Creates a new grantor with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionGrantor for PostgresSubscriptionGrantor {
    async fn grant(
        &self,
        user_id: &UserId,
        tier: SubscriptionTier,
        duration_days: i64,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET subscription_tier = $2,
                subscription_expires_at =
                    GREATEST(COALESCE(subscription_expires_at, NOW()), NOW())
                    + make_interval(days => $3::int)
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(tier.as_str())
        .bind(duration_days)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to grant subscription: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::UserNotFound,
                format!("No user {} to grant subscription to", user_id),
            ));
        }

        tracing::info!(
            user_id = %user_id,
            tier = %tier,
            duration_days,
            "subscription granted"
        );
        Ok(())
    }
}
