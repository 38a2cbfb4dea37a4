//! Configuration management for the shop dashboard backend
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with SHOPDASH prefix (`SHOPDASH__DATABASE__URL`)

use config::{ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    pub server: ServerConfig,

    pub storage: StorageConfig,

    pub database: DatabaseConfig,

    pub jwt: JwtConfig,

    pub ledger: LedgerConfig,

    pub pricing: PricingConfig,

    pub context: ContextConfig,

    /// Text-completion endpoint for the assistant; the assistant is disabled when absent
    #[serde(default)]
    pub assistant: Option<AssistantConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

/// Which store implementation backs the services
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    /// Process-local store, for demos and tests. Data is lost on restart.
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    #[serde(default)]
    pub url: String,

    pub max_connections: u32,

    pub min_connections: u32,

    /// Seconds to wait for a pooled connection
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key used to verify bearer tokens
    pub secret: String,
}

/// Whether stock adjustments may take an item below zero
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NegativeStockPolicy {
    #[default]
    Allow,
    Reject,
}

impl NegativeStockPolicy {
    pub fn allows_negative(&self) -> bool {
        matches!(self, NegativeStockPolicy::Allow)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LedgerConfig {
    pub negative_stock: NegativeStockPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PricingConfig {
    /// Hourly labor rate used when a product does not specify one
    pub default_hourly_rate: Decimal,

    /// ISO currency code used for display strings
    pub currency: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContextConfig {
    /// Average margin reported when a business has no products yet
    pub default_margin_percent: Decimal,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AssistantConfig {
    /// Chat-completion endpoint URL
    pub endpoint: String,

    pub api_key: String,

    pub model: String,

    #[serde(default = "default_assistant_timeout")]
    pub timeout_secs: u64,
}

fn default_assistant_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("SHOPDASH_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = Self::builder(&environment)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (SHOPDASH prefix)
            .add_source(
                Environment::with_prefix("SHOPDASH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Defaults only, without files or environment overrides
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::builder("development")?.build()?.try_deserialize()
    }

    fn builder(
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        config::Config::builder()
            .set_default("environment", environment)?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("storage.backend", "postgres")?
            .set_default("database.url", "")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("jwt.secret", "development-secret-key")?
            .set_default("ledger.negative_stock", "allow")?
            .set_default("pricing.default_hourly_rate", "15")?
            .set_default("pricing.currency", "USD")?
            .set_default("context.default_margin_percent", "40")
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
