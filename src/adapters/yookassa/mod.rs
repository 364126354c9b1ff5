//! YooKassa gateway adapter.
//!
//! Implements the `PaymentGateway` port against the YooKassa v3 REST API.

mod client;
mod dto;

pub use client::YooKassaClient;
