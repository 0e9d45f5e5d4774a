//! Session store database configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::duration::parse_duration;
use crate::error::AppError;

/// Raw PostgreSQL settings for the session store.
///
/// Every session query is a short single-row statement, so the pool is
/// small and the timeouts are measured in seconds. Call
/// [`DatabaseConfig::validate`] to obtain the [`PoolSettings`] the
/// connection layer uses.
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL (may carry a password).
    pub url: String,
    /// Upper bound on pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connections kept open while idle.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// How long a caller waits for a free connection.
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout: String,
    /// How long an unused connection stays in the pool.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: String,
    /// Server-side `statement_timeout`; bounds how long a statement may
    /// wait on a share-locked epoch row.
    #[serde(default = "default_statement_timeout")]
    pub statement_timeout: String,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"****")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("idle_timeout", &self.idle_timeout)
            .field("statement_timeout", &self.statement_timeout)
            .finish()
    }
}

/// Validated pool settings derived from [`DatabaseConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    /// Upper bound on pooled connections, at least one.
    pub max_connections: u32,
    /// Never above `max_connections`.
    pub min_connections: u32,
    /// Wait for a free connection.
    pub acquire_timeout: Duration,
    /// Idle connection lifetime.
    pub idle_timeout: Duration,
    /// Per-statement limit enforced by the server.
    pub statement_timeout: Duration,
}

impl DatabaseConfig {
    /// Settings for `url` with every other field at its default.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            acquire_timeout: default_acquire_timeout(),
            idle_timeout: default_idle_timeout(),
            statement_timeout: default_statement_timeout(),
        }
    }

    /// Checks the section and converts it into [`PoolSettings`].
    pub fn validate(&self) -> Result<PoolSettings, AppError> {
        if self.url.trim().is_empty() {
            return Err(AppError::configuration("database.url must not be empty"));
        }
        if self.max_connections == 0 {
            return Err(AppError::configuration(
                "database.max_connections must be at least 1",
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(AppError::configuration(format!(
                "database.min_connections ({}) exceeds database.max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }

        Ok(PoolSettings {
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            acquire_timeout: field_duration("database.acquire_timeout", &self.acquire_timeout)?,
            idle_timeout: field_duration("database.idle_timeout", &self.idle_timeout)?,
            statement_timeout: field_duration(
                "database.statement_timeout",
                &self.statement_timeout,
            )?,
        })
    }
}

fn field_duration(field: &str, value: &str) -> Result<Duration, AppError> {
    parse_duration(value).map_err(|e| AppError::configuration(format!("{field}: {}", e.message)))
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_acquire_timeout() -> String {
    "3s".to_string()
}

fn default_idle_timeout() -> String {
    "10m".to_string()
}

fn default_statement_timeout() -> String {
    "5s".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults_validate() {
        let settings = DatabaseConfig::from_url("postgres://localhost/warden")
            .validate()
            .unwrap();
        assert_eq!(settings.max_connections, 10);
        assert_eq!(settings.min_connections, 1);
        assert_eq!(settings.acquire_timeout, Duration::from_secs(3));
        assert_eq!(settings.idle_timeout, Duration::from_secs(600));
        assert_eq!(settings.statement_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_empty_url_is_rejected() {
        let err = DatabaseConfig::from_url("  ").validate().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[test]
    fn test_min_above_max_is_rejected() {
        let mut config = DatabaseConfig::from_url("postgres://localhost/warden");
        config.min_connections = 4;
        config.max_connections = 2;
        let err = config.validate().unwrap_err();
        assert!(err.message.contains("min_connections"));
    }

    #[test]
    fn test_bad_statement_timeout_names_field() {
        let mut config = DatabaseConfig::from_url("postgres://localhost/warden");
        config.statement_timeout = "soon".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.message.starts_with("database.statement_timeout"));
    }

    #[test]
    fn test_debug_hides_url() {
        let config = DatabaseConfig::from_url("postgres://warden:secret@db/warden");
        assert!(!format!("{config:?}").contains("secret"));
    }
}
