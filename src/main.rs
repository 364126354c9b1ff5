//! Subpay service entry point.
//!
//! Wires configuration, the gateway client, Postgres adapters, and the
//! reconciliation engine into an Axum server.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use subpay::adapters::http::payments::{payments_router, PaymentsAppState};
use subpay::adapters::postgres::{PostgresPaymentRepository, PostgresSubscriptionGrantor};
use subpay::adapters::yookassa::YooKassaClient;
use subpay::application::ReconciliationService;
use subpay::config::AppConfig;
use subpay::domain::payment::WebhookSignatureVerifier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    config.validate()?;

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        tracing::info!("running database migrations");
        sqlx::migrate!().run(&pool).await?;
    }

    let request_timeout = Duration::from_secs(config.server.request_timeout_secs);
    let gateway = Arc::new(YooKassaClient::new(&config.gateway, request_timeout)?);
    let repository = Arc::new(PostgresPaymentRepository::new(pool.clone()));
    let grantor = Arc::new(PostgresSubscriptionGrantor::new(pool));

    let verifier = WebhookSignatureVerifier::from_optional(config.gateway.webhook_secret.clone());
    if !verifier.is_enforcing() {
        tracing::warn!(
            "gateway.webhook_secret is not configured; webhook signature \
             verification is DISABLED (development mode only)"
        );
    }

    let service = Arc::new(ReconciliationService::new(
        gateway,
        repository,
        grantor,
        verifier,
        config.pricing.clone(),
        config.gateway.return_url.clone(),
    ));

    let cors = if config.server.cors_origins_list().is_empty() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<http::HeaderValue> = config
            .server
            .cors_origins_list()
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(origins)
    };

    let app = Router::new()
        .nest("/api", payments_router())
        .with_state(PaymentsAppState { service })
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors);

    let addr = config.server.socket_addr();
    tracing::info!(%addr, "subpay listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
