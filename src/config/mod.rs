//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Server, database, and auth sections load
//! with the `SAHAYOG` prefix and `__` separators; provider secrets come
//! from the documented unprefixed variables via [`PaymentConfig::from_env`].
//!
//! # Example
//!
//! ```no_run
//! use sahayog::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr());
//! ```

mod auth;
mod database;
mod error;
mod payment;
mod server;

pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::{EsewaCredentials, KhaltiCredentials, PaymentConfig, StripeCredentials};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Deserialize)]
struct PrefixedConfig {
    #[serde(default)]
    server: ServerConfig,
    database: DatabaseConfig,
    auth: AuthConfig,
}

/// Root application configuration
///
/// Load using [`AppConfig::load()`], which reads from environment
/// variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, URLs)
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Admin authentication configuration
    pub auth: AuthConfig,

    /// Payment gateway configuration (mode + provider secrets)
    pub payment: PaymentConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Environment Variable Format
    ///
    /// - `SAHAYOG__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `SAHAYOG__DATABASE__URL=...` -> `database.url = ...`
    /// - `SAHAYOG__AUTH__ADMIN_JWT_SECRET=...` -> `auth.admin_jwt_secret`
    ///
    /// Provider secrets use their documented names (`STRIPE_SECRET_KEY`,
    /// `KHALTI_SECRET_KEY`, `ESEWA_MERCHANT_ID`, ...); an absent secret
    /// excludes that provider instead of failing the load.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let prefixed: PrefixedConfig = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("SAHAYOG")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(Self {
            server: prefixed.server,
            database: prefixed.database,
            auth: prefixed.auth,
            payment: PaymentConfig::from_env(),
        })
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.auth.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
