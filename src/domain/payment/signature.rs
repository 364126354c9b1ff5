//! Webhook signature verification.
//!
//! Authenticates inbound gateway notifications with HMAC-SHA256 over the
//! canonical JSON serialization of the payload, compared in constant time.
//!
//! Canonical form: compact separators, stable key order at every nesting
//! level, non-ASCII preserved. `serde_json::to_string` over `Value`
//! produces exactly this (its map type is ordered by key).

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Verifier for gateway webhook signatures.
///
/// When no secret is configured, verification is bypassed and always
/// succeeds. This is a development-mode fallback only; it disables the
/// authenticity guarantee and logs loudly on every call.
#[derive(Clone)]
pub struct WebhookSignatureVerifier {
    secret: Option<SecretString>,
}

impl WebhookSignatureVerifier {
    /// Creates a verifier with the given webhook secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(SecretString::new(secret.into())),
        }
    }

    /// Creates a verifier with verification disabled (no secret).
    pub fn disabled() -> Self {
        Self { secret: None }
    }

    /// Creates a verifier from an optional secret, treating an empty
    /// string as unconfigured.
    pub fn from_optional(secret: Option<SecretString>) -> Self {
        Self {
            secret: secret.filter(|s| !s.expose_secret().is_empty()),
        }
    }

    /// Returns true when a secret is configured and signatures are
    /// actually checked.
    pub fn is_enforcing(&self) -> bool {
        self.secret.is_some()
    }

    /// Verifies a hex-encoded HMAC-SHA256 signature against the payload.
    ///
    /// Returns false on any malformed input; never panics or propagates
    /// an error. Comparison of the decoded signature is constant-time.
    pub fn verify(&self, payload: &serde_json::Value, provided_signature: &str) -> bool {
        let Some(secret) = &self.secret else {
            tracing::warn!(
                "webhook secret not configured, skipping signature verification; \
                 configure gateway.webhook_secret before production use"
            );
            return true;
        };

        let canonical = match serde_json::to_string(payload) {
            Ok(body) => body,
            Err(err) => {
                tracing::error!(error = %err, "failed to canonicalize webhook payload");
                return false;
            }
        };

        let Ok(provided) = hex::decode(provided_signature.trim()) else {
            tracing::warn!("webhook signature is not valid hex");
            return false;
        };

        let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(canonical.as_bytes());
        let expected = mac.finalize().into_bytes();

        let valid = constant_time_compare(expected.as_slice(), &provided);
        if !valid {
            tracing::warn!("invalid webhook signature");
        }
        valid
    }
}

/// Performs constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
