//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! TOML files and `WARDEN__`-prefixed environment variables. Each
//! sub-module represents a logical configuration section.

pub mod auth;
pub mod database;
pub mod duration;
pub mod logging;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::auth::{AuthConfig, TokenPolicy};
pub use self::database::{DatabaseConfig, PoolSettings};
pub use self::duration::parse_duration;
pub use self::logging::LoggingConfig;
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// Constructed once at startup and treated as immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Token signing and lifetime settings.
    pub auth: AuthConfig,
    /// Background sweep settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files and the environment.
    ///
    /// Merges `path` (e.g. `config/default.toml`), an optional
    /// `config/{env}.toml` overlay and environment variables prefixed with
    /// `WARDEN__` (for example `WARDEN__AUTH__JWT_SECRET`).
    pub fn load(path: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("WARDEN")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Parse configuration from an in-memory TOML document.
    pub fn from_toml(document: &str) -> Result<Self, AppError> {
        config::Config::builder()
            .add_source(config::File::from_str(document, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
            .map_err(AppError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_toml_applies_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [database]
            url = "postgres://warden:pw@localhost/warden"

            [auth]
            jwt_secret = "s3cret"
            "#,
        )
        .unwrap();

        assert_eq!(config.auth.access_token_ttl, "15m");
        assert_eq!(config.auth.refresh_token_ttl, "7d");
        assert!(!config.auth.revoke_on_replay);
        assert_eq!(config.database.max_connections, 10);
        assert!(config.database.validate().is_ok());
        assert!(config.worker.enabled);
        assert_eq!(config.logging.format, "json");
        assert!(config.auth.validate().is_ok());
    }

    #[test]
    fn test_missing_database_section_fails() {
        let err = AppConfig::from_toml("[auth]\njwt_secret = \"x\"\n").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
    }
}
