//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment
//! variables using the `config` and `dotenvy` crates. Configuration is
//! loaded with the `SUBPAY` prefix and nested values use double
//! underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use subpay::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr());
//! ```

mod database;
mod error;
mod gateway;
mod pricing;
mod server;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use gateway::GatewayConfig;
pub use pricing::PricingConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Contains all configuration sections for the subpay service.
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Gateway configuration (YooKassa credentials and URLs)
    pub gateway: GatewayConfig,

    /// Tier pricing (monthly prices in RUB)
    #[serde(default)]
    pub pricing: PricingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with the `SUBPAY` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `SUBPAY__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `SUBPAY__GATEWAY__SHOP_ID=...` -> `gateway.shop_id = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required environment variables are missing
    /// or values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("SUBPAY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.gateway.validate()?;
        self.pricing.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Helper to set environment variables for testing
    /// Uses double underscores to separate nested config values
    fn set_minimal_env() {
        env::set_var("SUBPAY__DATABASE__URL", "postgresql://test@localhost/subpay");
        env::set_var("SUBPAY__GATEWAY__SHOP_ID", "123456");
        env::set_var("SUBPAY__GATEWAY__SECRET_KEY", "test_secret");
        env::set_var(
            "SUBPAY__GATEWAY__RETURN_URL",
            "https://app.example.com/payments/return",
        );
        env::set_var("SUBPAY__PRICING__PRO_MONTHLY_RUB", "500");
        env::set_var("SUBPAY__PRICING__ULTRA_MONTHLY_RUB", "1500");
    }

    /// Helper to clear environment variables after testing
    fn clear_env() {
        env::remove_var("SUBPAY__DATABASE__URL");
        env::remove_var("SUBPAY__GATEWAY__SHOP_ID");
        env::remove_var("SUBPAY__GATEWAY__SECRET_KEY");
        env::remove_var("SUBPAY__GATEWAY__RETURN_URL");
        env::remove_var("SUBPAY__GATEWAY__WEBHOOK_SECRET");
        env::remove_var("SUBPAY__PRICING__PRO_MONTHLY_RUB");
        env::remove_var("SUBPAY__PRICING__ULTRA_MONTHLY_RUB");
        env::remove_var("SUBPAY__SERVER__PORT");
        env::remove_var("SUBPAY__SERVER__ENVIRONMENT");
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.database.url, "postgresql://test@localhost/subpay");
        assert_eq!(config.gateway.shop_id, "123456");
        assert_eq!(config.pricing.pro_monthly_rub, 500);
    }

    #[test]
    fn test_validate_full_config() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok());
        let config = result.unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_server_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("SUBPAY__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
    }

    #[test]
    fn test_webhook_secret_is_optional() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let config = AppConfig::load().unwrap();
        clear_env();

        assert!(!config.gateway.verifies_webhooks());
    }
}
