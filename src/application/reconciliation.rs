//! Reconciliation engine - the payment lifecycle state machine.
//!
//! ## Confirmation policy
//!
//! Transitions are driven only by freshly fetched gateway records. A
//! webhook body is a trigger to re-fetch by id, never a source of state:
//! this defeats spoofed or stale webhook payloads even when they arrive
//! over an authenticated channel.
//!
//! ## Exactly-once grant
//!
//! The first transition of a payment into `Succeeded` grants the
//! subscription, as part of the same update. A payment already in
//! `Succeeded` short-circuits: no gateway query, no grant, no mutation.
//! Under concurrent duplicate deliveries the repository's per-payment
//! update guard serializes the check-grant-commit section; the gateway
//! call happens before the guard is taken so no lock is held across
//! network I/O to the gateway.

use std::sync::Arc;

use uuid::Uuid;

use crate::config::PricingConfig;
use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::payment::{
    Payment, PaymentError, PaymentStatus, SubscriptionTier, WebhookSignatureVerifier,
};
use crate::ports::{
    CreateIntentRequest, GatewayError, IntentMetadata, PaymentGateway, PaymentRepository,
    SubscriptionGrantor,
};

/// Days of subscription granted per successful payment.
pub const GRANT_DURATION_DAYS: i64 = 30;

/// Settlement currency. Prices are configured in whole rubles and stored
/// in kopecks.
const CURRENCY: &str = "RUB";

/// The payment reconciliation engine.
///
/// Owns the state machine, idempotency key generation, the
/// re-fetch-before-trust confirmation policy, and the single-fire
/// subscription grant.
pub struct ReconciliationService {
    gateway: Arc<dyn PaymentGateway>,
    repository: Arc<dyn PaymentRepository>,
    grantor: Arc<dyn SubscriptionGrantor>,
    verifier: WebhookSignatureVerifier,
    pricing: PricingConfig,
    return_url: String,
}

impl ReconciliationService {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        repository: Arc<dyn PaymentRepository>,
        grantor: Arc<dyn SubscriptionGrantor>,
        verifier: WebhookSignatureVerifier,
        pricing: PricingConfig,
        return_url: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            repository,
            grantor,
            verifier,
            pricing,
            return_url: return_url.into(),
        }
    }

    /// Creates a payment intent for a tier purchase.
    ///
    /// Resolves the tier price from configuration (a non-positive price is
    /// not purchasable), generates a fresh idempotence key — a retried
    /// creation is a new intent, not deduplicated here — and persists the
    /// resulting payment in its initial state with the payer-facing
    /// confirmation link.
    ///
    /// # Errors
    ///
    /// - `InvalidTierPrice` when the tier has no positive configured price
    /// - `GatewayUnavailable` / `Gateway` when the remote call fails; no
    ///   payment is persisted in that case
    /// - `Storage` when persisting the created payment fails
    pub async fn create_payment(
        &self,
        user_id: UserId,
        tier: SubscriptionTier,
    ) -> Result<Payment, PaymentError> {
        let price_rub = self.pricing.price_rub(tier);
        if price_rub <= 0 {
            return Err(PaymentError::InvalidTierPrice { tier, price_rub });
        }
        let amount_minor_units = price_rub * 100;
        let description = Payment::describe(tier, &user_id);

        let intent = self
            .gateway
            .create_intent(CreateIntentRequest {
                amount_minor_units,
                currency: CURRENCY.to_string(),
                return_url: self.return_url.clone(),
                description: description.clone(),
                metadata: IntentMetadata { user_id, tier },
                idempotence_key: Uuid::new_v4(),
            })
            .await
            .map_err(map_gateway_error)?;

        let payment = Payment::new(
            intent.id,
            user_id,
            tier,
            amount_minor_units,
            PaymentStatus::from_gateway(&intent.status),
            intent.confirmation_url,
            description,
        );
        self.repository.insert(&payment).await?;

        tracing::info!(
            payment_id = %payment.id,
            gateway_payment_id = %payment.gateway_payment_id,
            user_id = %payment.user_id,
            tier = %tier,
            amount_minor_units,
            "payment created"
        );
        Ok(payment)
    }

    /// Reconciles a payment against the gateway's current state.
    ///
    /// A payment already in `Succeeded` is returned as-is without querying
    /// the gateway or the grantor. Otherwise the intent is re-fetched, the
    /// status mapped, and — under the per-payment update guard — the grant
    /// fired when the payment newly succeeded, then the new state
    /// committed. `processed_at` and the cancellation reason are updated
    /// on every confirmed read, even when the status is unchanged.
    ///
    /// # Errors
    ///
    /// - `NotFound` when no local payment correlates with the id
    /// - `GatewayUnavailable` / `Gateway` when the re-fetch fails; local
    ///   state is left untouched
    /// - `GrantFailed` when the subscription grant fails; the status
    ///   commit is aborted so the payment stays retriable
    pub async fn check_payment(
        &self,
        gateway_payment_id: &str,
    ) -> Result<Payment, PaymentError> {
        let payment = self
            .repository
            .find_by_gateway_id(gateway_payment_id)
            .await?
            .ok_or_else(|| PaymentError::NotFound(gateway_payment_id.to_string()))?;

        if payment.is_settled() {
            return Ok(payment);
        }

        // Remote read happens before any lock is taken.
        let intent = self
            .gateway
            .find_intent(gateway_payment_id)
            .await
            .map_err(map_gateway_error)?;
        let mapped = PaymentStatus::from_gateway(&intent.status);

        let guard = self
            .repository
            .lock_for_update(gateway_payment_id)
            .await?
            .ok_or_else(|| PaymentError::NotFound(gateway_payment_id.to_string()))?;

        // Re-check under the lock: a concurrent reconciliation may have
        // settled the payment since the unlocked read above.
        let current = guard.payment().clone();
        if current.is_settled() {
            return Ok(current);
        }

        let newly_succeeded = mapped.is_succeeded();
        if newly_succeeded {
            // Grant and status commit are one logical unit: a grant
            // failure drops the guard and leaves the pre-grant state.
            self.grantor
                .grant(&current.user_id, current.tier, GRANT_DURATION_DAYS)
                .await
                .map_err(|err| PaymentError::GrantFailed {
                    reason: err.to_string(),
                })?;
        }

        let mut updated = current;
        updated.record_gateway_state(mapped, intent.cancellation_reason, Timestamp::now());
        let committed = guard.commit(updated).await?;

        if newly_succeeded {
            tracing::info!(
                gateway_payment_id,
                user_id = %committed.user_id,
                tier = %committed.tier,
                duration_days = GRANT_DURATION_DAYS,
                "payment succeeded, subscription granted"
            );
        } else {
            tracing::debug!(
                gateway_payment_id,
                status = %committed.status,
                "payment reconciled"
            );
        }
        Ok(committed)
    }

    /// Handles an inbound gateway webhook.
    ///
    /// The payload is only a trigger: after optional signature
    /// verification the gateway payment id is extracted from `object.id`
    /// and reconciliation re-fetches the intent — the body's status and
    /// amount fields are never read for decision-making.
    ///
    /// Never fails into the delivery channel: an invalid signature, a
    /// missing id, or a reconciliation error all yield `None` (logged),
    /// so the gateway's retry machinery is not triggered by deliveries we
    /// chose to ignore.
    pub async fn handle_webhook(
        &self,
        payload: &serde_json::Value,
        signature: Option<&str>,
    ) -> Option<Payment> {
        if let Some(signature) = signature {
            if !self.verifier.verify(payload, signature) {
                tracing::warn!("webhook rejected: signature verification failed");
                return None;
            }
        }

        let Some(gateway_payment_id) = payload
            .get("object")
            .and_then(|object| object.get("id"))
            .and_then(|id| id.as_str())
        else {
            tracing::debug!("webhook ignored: payload carries no object.id");
            return None;
        };

        match self.check_payment(gateway_payment_id).await {
            Ok(payment) => Some(payment),
            Err(err) => {
                tracing::error!(
                    gateway_payment_id,
                    error = %err,
                    "webhook reconciliation failed"
                );
                None
            }
        }
    }
}

fn map_gateway_error(err: GatewayError) -> PaymentError {
    match err {
        GatewayError::Unavailable(message) => PaymentError::GatewayUnavailable(message),
        GatewayError::Service { status, message } => PaymentError::Gateway {
            message: format!("{} ({})", message, status),
        },
        GatewayError::InvalidResponse(message) => PaymentError::Gateway { message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPaymentRepository;
    use crate::domain::foundation::{DomainError, ErrorCode};
    use crate::ports::GatewayIntent;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Implementations
    // ════════════════════════════════════════════════════════════════════════════

    struct MockGateway {
        create_result: Mutex<Option<Result<GatewayIntent, GatewayError>>>,
        find_result: Mutex<Option<Result<GatewayIntent, GatewayError>>>,
        create_calls: AtomicU32,
        find_calls: AtomicU32,
        idempotence_keys: Mutex<Vec<Uuid>>,
    }

    impl MockGateway {
        fn new() -> Self {
            Self {
                create_result: Mutex::new(None),
                find_result: Mutex::new(None),
                create_calls: AtomicU32::new(0),
                find_calls: AtomicU32::new(0),
                idempotence_keys: Mutex::new(Vec::new()),
            }
        }

        fn creating(intent: GatewayIntent) -> Self {
            let gateway = Self::new();
            *gateway.create_result.lock().unwrap() = Some(Ok(intent));
            gateway
        }

        fn finding(intent: GatewayIntent) -> Self {
            let gateway = Self::new();
            *gateway.find_result.lock().unwrap() = Some(Ok(intent));
            gateway
        }

        fn failing_create(err: GatewayError) -> Self {
            let gateway = Self::new();
            *gateway.create_result.lock().unwrap() = Some(Err(err));
            gateway
        }

        fn failing_find(err: GatewayError) -> Self {
            let gateway = Self::new();
            *gateway.find_result.lock().unwrap() = Some(Err(err));
            gateway
        }

        fn create_calls(&self) -> u32 {
            self.create_calls.load(Ordering::SeqCst)
        }

        fn find_calls(&self) -> u32 {
            self.find_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PaymentGateway for MockGateway {
        async fn create_intent(
            &self,
            request: CreateIntentRequest,
        ) -> Result<GatewayIntent, GatewayError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            self.idempotence_keys
                .lock()
                .unwrap()
                .push(request.idempotence_key);
            self.create_result
                .lock()
                .unwrap()
                .clone()
                .expect("create_intent not stubbed")
        }

        async fn find_intent(
            &self,
            _gateway_payment_id: &str,
        ) -> Result<GatewayIntent, GatewayError> {
            self.find_calls.fetch_add(1, Ordering::SeqCst);
            self.find_result
                .lock()
                .unwrap()
                .clone()
                .expect("find_intent not stubbed")
        }
    }

    struct MockGrantor {
        calls: Mutex<Vec<(UserId, SubscriptionTier, i64)>>,
        call_count: AtomicU32,
        should_fail: bool,
    }

    impl MockGrantor {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                call_count: AtomicU32::new(0),
                should_fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                call_count: AtomicU32::new(0),
                should_fail: true,
            }
        }

        fn call_count(&self) -> u32 {
            self.call_count.load(Ordering::SeqCst)
        }

        fn calls(&self) -> Vec<(UserId, SubscriptionTier, i64)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SubscriptionGrantor for MockGrantor {
        async fn grant(
            &self,
            user_id: &UserId,
            tier: SubscriptionTier,
            duration_days: i64,
        ) -> Result<(), DomainError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if self.should_fail {
                return Err(DomainError::new(
                    ErrorCode::UserNotFound,
                    "simulated grant failure",
                ));
            }
            self.calls
                .lock()
                .unwrap()
                .push((*user_id, tier, duration_days));
            Ok(())
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════════

    const GATEWAY_ID: &str = "2d9cafc5-000f-5000-8000-18db351245c7";
    const WEBHOOK_SECRET: &str = "whk_test_secret";

    fn test_pricing() -> PricingConfig {
        PricingConfig {
            pro_monthly_rub: 500,
            ultra_monthly_rub: 1500,
        }
    }

    fn created_intent() -> GatewayIntent {
        GatewayIntent {
            id: GATEWAY_ID.to_string(),
            status: "pending".to_string(),
            confirmation_url: Some(
                "https://yoomoney.ru/checkout/payments/v2?orderId=x".to_string(),
            ),
            amount_minor_units: Some(50_000),
            cancellation_reason: None,
        }
    }

    fn intent_with_status(status: &str) -> GatewayIntent {
        GatewayIntent {
            id: GATEWAY_ID.to_string(),
            status: status.to_string(),
            confirmation_url: None,
            amount_minor_units: Some(50_000),
            cancellation_reason: None,
        }
    }

    struct Fixture {
        gateway: Arc<MockGateway>,
        repository: Arc<InMemoryPaymentRepository>,
        grantor: Arc<MockGrantor>,
        service: ReconciliationService,
    }

    fn fixture(gateway: MockGateway, grantor: MockGrantor) -> Fixture {
        let gateway = Arc::new(gateway);
        let repository = Arc::new(InMemoryPaymentRepository::new());
        let grantor = Arc::new(grantor);
        let service = ReconciliationService::new(
            gateway.clone(),
            repository.clone(),
            grantor.clone(),
            WebhookSignatureVerifier::new(WEBHOOK_SECRET),
            test_pricing(),
            "https://app.example.com/payments/return",
        );
        Fixture {
            gateway,
            repository,
            grantor,
            service,
        }
    }

    async fn seed_pending_payment(repository: &InMemoryPaymentRepository) -> Payment {
        let payment = Payment::new(
            GATEWAY_ID,
            UserId::new(),
            SubscriptionTier::Pro,
            50_000,
            PaymentStatus::Pending,
            Some("https://yoomoney.ru/checkout/payments/v2?orderId=x".to_string()),
            "Pro subscription for user test",
        );
        repository.insert(&payment).await.unwrap();
        payment
    }

    fn sign(payload: &serde_json::Value) -> String {
        use hmac::{Hmac, Mac};
        let canonical = serde_json::to_string(payload).unwrap();
        let mut mac =
            Hmac::<sha2::Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
        mac.update(canonical.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn webhook_payload() -> serde_json::Value {
        json!({
            "type": "notification",
            "event": "payment.succeeded",
            "object": {
                "id": GATEWAY_ID,
                "status": "succeeded",
                "amount": { "value": "500.00", "currency": "RUB" }
            }
        })
    }

    // ════════════════════════════════════════════════════════════════════════════
    // create_payment
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn create_payment_persists_pending_payment_with_confirmation_url() {
        let f = fixture(MockGateway::creating(created_intent()), MockGrantor::new());

        let payment = f
            .service
            .create_payment(UserId::new(), SubscriptionTier::Pro)
            .await
            .unwrap();

        assert_eq!(payment.gateway_payment_id, GATEWAY_ID);
        assert_eq!(payment.amount_minor_units, 50_000);
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(payment.confirmation_url.is_some());
        assert_eq!(f.repository.len().await, 1);
    }

    #[tokio::test]
    async fn create_payment_rejects_tier_without_price() {
        let f = fixture(MockGateway::creating(created_intent()), MockGrantor::new());

        let result = f
            .service
            .create_payment(UserId::new(), SubscriptionTier::Free)
            .await;

        assert!(matches!(
            result,
            Err(PaymentError::InvalidTierPrice { price_rub: 0, .. })
        ));
        assert_eq!(f.gateway.create_calls(), 0);
        assert!(f.repository.is_empty().await);
    }

    #[tokio::test]
    async fn create_payment_propagates_gateway_failure_without_persisting() {
        let f = fixture(
            MockGateway::failing_create(GatewayError::Unavailable("timeout".to_string())),
            MockGrantor::new(),
        );

        let result = f
            .service
            .create_payment(UserId::new(), SubscriptionTier::Pro)
            .await;

        assert!(matches!(result, Err(PaymentError::GatewayUnavailable(_))));
        assert!(f.repository.is_empty().await);
    }

    #[tokio::test]
    async fn create_payment_uses_fresh_idempotence_key_per_attempt() {
        let f = fixture(MockGateway::creating(created_intent()), MockGrantor::new());

        f.service
            .create_payment(UserId::new(), SubscriptionTier::Pro)
            .await
            .unwrap();
        // Second attempt collides on gateway id locally, but the gateway
        // must still have seen a distinct key.
        let _ = f
            .service
            .create_payment(UserId::new(), SubscriptionTier::Pro)
            .await;

        let keys = f.gateway.idempotence_keys.lock().unwrap().clone();
        assert_eq!(keys.len(), 2);
        assert_ne!(keys[0], keys[1]);
    }

    #[tokio::test]
    async fn create_payment_keeps_initial_status_reported_by_gateway() {
        let mut intent = created_intent();
        intent.status = "waiting_for_capture".to_string();
        let f = fixture(MockGateway::creating(intent), MockGrantor::new());

        let payment = f
            .service
            .create_payment(UserId::new(), SubscriptionTier::Ultra)
            .await
            .unwrap();

        assert_eq!(payment.status, PaymentStatus::WaitingForCapture);
        assert_eq!(payment.amount_minor_units, 150_000);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // check_payment
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn check_payment_fails_for_unknown_gateway_id() {
        let f = fixture(MockGateway::new(), MockGrantor::new());

        let result = f.service.check_payment("missing").await;

        assert!(matches!(result, Err(PaymentError::NotFound(_))));
        assert_eq!(f.gateway.find_calls(), 0);
    }

    #[tokio::test]
    async fn check_payment_grants_once_on_transition_to_succeeded() {
        let f = fixture(
            MockGateway::finding(intent_with_status("succeeded")),
            MockGrantor::new(),
        );
        let seeded = seed_pending_payment(&f.repository).await;

        let payment = f.service.check_payment(GATEWAY_ID).await.unwrap();

        assert_eq!(payment.status, PaymentStatus::Succeeded);
        assert!(payment.processed_at.is_some());
        assert_eq!(f.grantor.call_count(), 1);
        assert_eq!(
            f.grantor.calls(),
            vec![(seeded.user_id, SubscriptionTier::Pro, GRANT_DURATION_DAYS)]
        );
    }

    #[tokio::test]
    async fn check_payment_on_settled_payment_is_a_no_op() {
        let f = fixture(MockGateway::new(), MockGrantor::new());
        let mut payment = seed_pending_payment(&f.repository).await;

        // Settle it directly in the store.
        let guard = f.repository.lock_for_update(GATEWAY_ID).await.unwrap().unwrap();
        payment.record_gateway_state(PaymentStatus::Succeeded, None, Timestamp::now());
        guard.commit(payment).await.unwrap();

        let result = f.service.check_payment(GATEWAY_ID).await.unwrap();

        assert_eq!(result.status, PaymentStatus::Succeeded);
        assert_eq!(f.gateway.find_calls(), 0);
        assert_eq!(f.grantor.call_count(), 0);
    }

    #[tokio::test]
    async fn check_payment_propagates_gateway_failure_without_mutation() {
        let f = fixture(
            MockGateway::failing_find(GatewayError::Service {
                status: 503,
                message: "maintenance".to_string(),
            }),
            MockGrantor::new(),
        );
        seed_pending_payment(&f.repository).await;

        let result = f.service.check_payment(GATEWAY_ID).await;

        assert!(matches!(result, Err(PaymentError::Gateway { .. })));
        let stored = f
            .repository
            .find_by_gateway_id(GATEWAY_ID)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, PaymentStatus::Pending);
        assert!(stored.processed_at.is_none());
        assert_eq!(f.grantor.call_count(), 0);
    }

    #[tokio::test]
    async fn check_payment_aborts_commit_when_grant_fails() {
        let f = fixture(
            MockGateway::finding(intent_with_status("succeeded")),
            MockGrantor::failing(),
        );
        seed_pending_payment(&f.repository).await;

        let result = f.service.check_payment(GATEWAY_ID).await;

        assert!(matches!(result, Err(PaymentError::GrantFailed { .. })));
        // Pre-grant state survives for a future retry.
        let stored = f
            .repository
            .find_by_gateway_id(GATEWAY_ID)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, PaymentStatus::Pending);
        assert!(stored.processed_at.is_none());
    }

    #[tokio::test]
    async fn check_payment_records_cancellation_reason() {
        let mut intent = intent_with_status("canceled");
        intent.cancellation_reason = Some("expired_on_confirmation".to_string());
        let f = fixture(MockGateway::finding(intent), MockGrantor::new());
        seed_pending_payment(&f.repository).await;

        let payment = f.service.check_payment(GATEWAY_ID).await.unwrap();

        assert_eq!(payment.status, PaymentStatus::Canceled);
        assert_eq!(
            payment.error_message.as_deref(),
            Some("expired_on_confirmation")
        );
        assert_eq!(f.grantor.call_count(), 0);
    }

    #[tokio::test]
    async fn check_payment_refreshes_processed_at_even_when_status_unchanged() {
        let f = fixture(
            MockGateway::finding(intent_with_status("pending")),
            MockGrantor::new(),
        );
        seed_pending_payment(&f.repository).await;

        let payment = f.service.check_payment(GATEWAY_ID).await.unwrap();

        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(payment.processed_at.is_some());
        assert_eq!(f.grantor.call_count(), 0);
    }

    #[tokio::test]
    async fn check_payment_allows_non_terminal_churn() {
        let f = fixture(
            MockGateway::finding(intent_with_status("waiting_for_capture")),
            MockGrantor::new(),
        );
        seed_pending_payment(&f.repository).await;

        let payment = f.service.check_payment(GATEWAY_ID).await.unwrap();

        assert_eq!(payment.status, PaymentStatus::WaitingForCapture);
    }

    #[tokio::test]
    async fn check_payment_maps_unknown_gateway_status_to_pending() {
        let f = fixture(
            MockGateway::finding(intent_with_status("mystery_state")),
            MockGrantor::new(),
        );
        seed_pending_payment(&f.repository).await;

        let payment = f.service.check_payment(GATEWAY_ID).await.unwrap();

        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(f.grantor.call_count(), 0);
    }

    #[tokio::test]
    async fn concurrent_duplicate_checks_grant_exactly_once() {
        let f = fixture(
            MockGateway::finding(intent_with_status("succeeded")),
            MockGrantor::new(),
        );
        seed_pending_payment(&f.repository).await;

        let results = futures::future::join_all(
            (0..8).map(|_| f.service.check_payment(GATEWAY_ID)),
        )
        .await;

        for result in results {
            assert_eq!(result.unwrap().status, PaymentStatus::Succeeded);
        }
        assert_eq!(f.grantor.call_count(), 1);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // handle_webhook
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn webhook_with_valid_signature_reconciles() {
        let f = fixture(
            MockGateway::finding(intent_with_status("succeeded")),
            MockGrantor::new(),
        );
        seed_pending_payment(&f.repository).await;
        let payload = webhook_payload();
        let signature = sign(&payload);

        let result = f.service.handle_webhook(&payload, Some(&signature)).await;

        let payment = result.expect("webhook should be processed");
        assert_eq!(payment.status, PaymentStatus::Succeeded);
        assert_eq!(f.grantor.call_count(), 1);
        // State came from the re-fetch, not the body.
        assert_eq!(f.gateway.find_calls(), 1);
    }

    #[tokio::test]
    async fn webhook_with_invalid_signature_is_ignored_without_mutation() {
        let f = fixture(
            MockGateway::finding(intent_with_status("succeeded")),
            MockGrantor::new(),
        );
        seed_pending_payment(&f.repository).await;
        let payload = webhook_payload();

        let result = f
            .service
            .handle_webhook(&payload, Some(&hex::encode([0u8; 32])))
            .await;

        assert!(result.is_none());
        assert_eq!(f.gateway.find_calls(), 0);
        assert_eq!(f.grantor.call_count(), 0);
        let stored = f
            .repository
            .find_by_gateway_id(GATEWAY_ID)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn webhook_without_signature_is_processed() {
        let f = fixture(
            MockGateway::finding(intent_with_status("succeeded")),
            MockGrantor::new(),
        );
        seed_pending_payment(&f.repository).await;

        let result = f.service.handle_webhook(&webhook_payload(), None).await;

        assert!(result.is_some());
    }

    #[tokio::test]
    async fn webhook_without_object_id_is_ignored() {
        let f = fixture(MockGateway::new(), MockGrantor::new());
        let payload = json!({ "event": "payment.succeeded", "object": {} });

        let result = f.service.handle_webhook(&payload, None).await;

        assert!(result.is_none());
        assert_eq!(f.gateway.find_calls(), 0);
    }

    #[tokio::test]
    async fn webhook_swallows_reconciliation_errors() {
        let f = fixture(
            MockGateway::failing_find(GatewayError::Unavailable("down".to_string())),
            MockGrantor::new(),
        );
        seed_pending_payment(&f.repository).await;

        let result = f.service.handle_webhook(&webhook_payload(), None).await;

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn duplicate_webhook_for_settled_payment_is_idempotent() {
        let f = fixture(
            MockGateway::finding(intent_with_status("succeeded")),
            MockGrantor::new(),
        );
        seed_pending_payment(&f.repository).await;
        let payload = webhook_payload();
        let signature = sign(&payload);

        let first = f.service.handle_webhook(&payload, Some(&signature)).await;
        let second = f.service.handle_webhook(&payload, Some(&signature)).await;

        assert_eq!(first.unwrap().status, PaymentStatus::Succeeded);
        let second = second.expect("duplicate delivery still acknowledged");
        assert_eq!(second.status, PaymentStatus::Succeeded);
        // Second delivery short-circuited: one fetch, one grant in total.
        assert_eq!(f.gateway.find_calls(), 1);
        assert_eq!(f.grantor.call_count(), 1);
    }

    #[tokio::test]
    async fn webhook_body_status_is_never_trusted() {
        // Body claims success, but the gateway says pending: the payment
        // must stay pending and no grant may fire.
        let f = fixture(
            MockGateway::finding(intent_with_status("pending")),
            MockGrantor::new(),
        );
        seed_pending_payment(&f.repository).await;

        let payment = f
            .service
            .handle_webhook(&webhook_payload(), None)
            .await
            .expect("webhook processed");

        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(f.grantor.call_count(), 0);
    }
}
