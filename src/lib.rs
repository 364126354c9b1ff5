//! Subpay - Subscription Payment Reconciliation Service
//!
//! Reconciles a local subscription ledger with the YooKassa payment
//! gateway: creates payment intents, verifies webhook notifications, and
//! advances payment state to gateway-confirmed truth, granting the
//! purchased subscription exactly once per successful payment.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
