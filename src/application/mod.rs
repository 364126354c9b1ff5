//! Application layer - The reconciliation engine.
//!
//! Orchestrates the payment lifecycle across the gateway, the payment
//! store, and the subscription grantor.

mod reconciliation;

pub use reconciliation::{ReconciliationService, GRANT_DURATION_DAYS};
