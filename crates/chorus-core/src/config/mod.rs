//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! TOML files and `CHORUS__*` environment variables. Each sub-module
//! represents a logical configuration section, and every section has
//! defaults so an empty source yields a usable configuration.

pub mod api;
pub mod connection;
pub mod delivery;
pub mod effects;
pub mod logging;
pub mod session;

use serde::{Deserialize, Serialize};

pub use self::api::{ApiConfig, ReadReceiptTransport};
pub use self::connection::ConnectionConfig;
pub use self::delivery::DeliveryConfig;
pub use self::effects::EffectsConfig;
pub use self::logging::LoggingConfig;
pub use self::session::SessionConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Real-time connection settings.
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Delivery queue pacing.
    #[serde(default)]
    pub delivery: DeliveryConfig,
    /// Sound and vibration feedback.
    #[serde(default)]
    pub effects: EffectsConfig,
    /// REST backend settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// Session credentials.
    #[serde(default)]
    pub session: SessionConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default.toml`, an environment-specific overlay and
    /// environment variables prefixed with `CHORUS`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("CHORUS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        tracing::debug!(env, url = %config.connection.url, "Configuration loaded");
        Ok(config)
    }

    /// Parse configuration from an inline TOML document.
    pub fn from_toml_str(toml: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}
