//! Configuration management module.
//!
//! Supports loading configuration from:
//! - TOML files (config/default.toml, config/{profile}.toml)
//! - A `.env` file in the working directory
//! - Environment variables with `LUCKYNUMBER_WORKER__<SECTION>__<KEY>` pattern

mod server;
mod storage;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use server::ServerConfig;
pub use storage::{FileStorageConfig, PostgresStorageConfig, StorageBackend, StorageConfig};

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend configuration.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Number generation configuration.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from files and environment.
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. `config/default.toml`
    /// 2. `config/{LUCKYNUMBER_PROFILE}.toml` (if `LUCKYNUMBER_PROFILE` is set)
    /// 3. Environment variables with `LUCKYNUMBER_WORKER__` prefix
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env file is not an error
        let _ = dotenvy::dotenv();

        let profile =
            std::env::var("LUCKYNUMBER_PROFILE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{profile}")).required(false))
            // LUCKYNUMBER_WORKER__SERVER__PORT=8080 -> server.port = 8080
            .add_source(
                Environment::with_prefix("LUCKYNUMBER_WORKER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: Self = config.try_deserialize()?;
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("server.port cannot be 0".to_string()));
        }

        self.storage.validate()?;

        if self.generation.max_request_quantity == 0 {
            return Err(ConfigError::Message(
                "generation.max_request_quantity cannot be 0".to_string(),
            ));
        }

        if self.auth.admin_token.is_empty() {
            return Err(ConfigError::Message(
                "auth.admin_token cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Number generation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Largest quantity a single generation request may ask for.
    #[serde(default = "default_max_request_quantity")]
    pub max_request_quantity: u32,

    /// Extra generation attempts after the store reports a duplicate number.
    #[serde(default = "default_conflict_retries")]
    pub conflict_retries: u32,
}

const fn default_max_request_quantity() -> u32 {
    1000
}

const fn default_conflict_retries() -> u32 {
    3
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_request_quantity: default_max_request_quantity(),
            conflict_retries: default_conflict_retries(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Admin token for the `/v1` APIs.
    #[serde(default = "default_admin_token")]
    pub admin_token: String,
}

fn default_admin_token() -> String {
    "admin_change_me_in_production".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_token: default_admin_token(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: "text" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Install the Prometheus recorder and serve it on `/metrics`.
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

const fn default_metrics_enabled() -> bool {
    true
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            metrics_enabled: default_metrics_enabled(),
        }
    }
}
