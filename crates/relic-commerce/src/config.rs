//! Store configuration.
//!
//! All environment access happens here, once, at startup. The resulting
//! struct is passed by reference into the components that need it; nothing
//! downstream reads `std::env`.

use std::path::PathBuf;
use std::time::Duration;
use std::env;

use thiserror::Error;

use relic_db::DbConfig;
use relic_gateway::GatewayConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held a value that does not parse.
    #[error("invalid value for {0}")]
    InvalidValue(String),
}

/// Top-level configuration for the storefront engine.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// SQLite database file path.
    pub database_path: PathBuf,

    /// Payment provider API origin.
    pub gateway_base_url: String,

    /// Payment provider API key.
    pub gateway_api_key: String,

    /// Payment provider merchant identifier.
    pub gateway_merchant_id: String,

    /// Gateway request timeout. Bounds how long a fulfillment transaction
    /// can stay open waiting on the provider.
    pub gateway_timeout: Duration,

    /// ISO 4217 currency for all charges.
    pub currency: String,

    /// Shared access code for admin operations, if the deployment uses one.
    /// Checked by the surrounding application, carried here so it is
    /// configured in exactly one place.
    pub admin_access_code: Option<String>,
}

impl StoreConfig {
    /// Loads configuration from environment variables, with development
    /// defaults for everything but real credentials.
    pub fn from_env() -> Result<Self, ConfigError> {
        let gateway_timeout_secs: u64 = env::var("RELIC_GATEWAY_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("RELIC_GATEWAY_TIMEOUT_SECS".to_string()))?;

        Ok(StoreConfig {
            database_path: env::var("RELIC_DATABASE_PATH")
                .unwrap_or_else(|_| "./relic.db".to_string())
                .into(),

            gateway_base_url: env::var("RELIC_GATEWAY_BASE_URL")
                .unwrap_or_else(|_| "https://stg-api.sandbox.paypay.ne.jp".to_string()),

            // Development placeholders. Real deployments MUST set these.
            gateway_api_key: env::var("RELIC_GATEWAY_API_KEY")
                .unwrap_or_else(|_| "relic-dev-api-key".to_string()),

            gateway_merchant_id: env::var("RELIC_GATEWAY_MERCHANT_ID")
                .unwrap_or_else(|_| "relic-dev-merchant".to_string()),

            gateway_timeout: Duration::from_secs(gateway_timeout_secs),

            currency: env::var("RELIC_CURRENCY").unwrap_or_else(|_| "JPY".to_string()),

            admin_access_code: env::var("RELIC_ADMIN_ACCESS_CODE").ok(),
        })
    }

    /// The database layer's view of this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
    }

    /// The gateway layer's view of this configuration.
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig::new(
            self.gateway_base_url.clone(),
            self.gateway_api_key.clone(),
            self.gateway_merchant_id.clone(),
        )
        .currency(self.currency.clone())
        .request_timeout(self.gateway_timeout)
    }
}
