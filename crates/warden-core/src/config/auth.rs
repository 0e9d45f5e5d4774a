//! Token signing and lifetime configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::duration::parse_duration;
use crate::error::AppError;

/// Raw authentication settings as they appear in configuration files.
///
/// Lifetimes are duration strings (`"15m"`, `"7d"`); call
/// [`AuthConfig::validate`] once at startup to obtain a [`TokenPolicy`].
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Symmetric secret used to sign access and refresh tokens (HMAC-SHA256).
    #[serde(default)]
    pub jwt_secret: String,
    /// Access token lifetime.
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl: String,
    /// Refresh token lifetime.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl: String,
    /// Deadline applied to every session store call.
    #[serde(default = "default_store_timeout")]
    pub store_timeout: String,
    /// Revoke every session of a principal when a refresh token replay is detected.
    #[serde(default)]
    pub revoke_on_replay: bool,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"****")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("store_timeout", &self.store_timeout)
            .field("revoke_on_replay", &self.revoke_on_replay)
            .finish()
    }
}

/// Validated, immutable token policy derived from [`AuthConfig`].
#[derive(Clone)]
pub struct TokenPolicy {
    /// Signing secret, guaranteed non-empty.
    pub secret: String,
    /// Access token lifetime.
    pub access_ttl: chrono::Duration,
    /// Refresh token lifetime; always longer than `access_ttl`.
    pub refresh_ttl: chrono::Duration,
    /// Deadline for each store call.
    pub store_timeout: Duration,
    /// See [`AuthConfig::revoke_on_replay`].
    pub revoke_on_replay: bool,
}

impl std::fmt::Debug for TokenPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPolicy")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("store_timeout", &self.store_timeout)
            .field("revoke_on_replay", &self.revoke_on_replay)
            .finish()
    }
}

impl AuthConfig {
    /// Checks the section and converts it into a [`TokenPolicy`].
    pub fn validate(&self) -> Result<TokenPolicy, AppError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(AppError::configuration("auth.jwt_secret must not be empty"));
        }

        let access_ttl = to_chrono("auth.access_token_ttl", &self.access_token_ttl)?;
        let refresh_ttl = to_chrono("auth.refresh_token_ttl", &self.refresh_token_ttl)?;

        if access_ttl >= refresh_ttl {
            return Err(AppError::configuration(format!(
                "auth.access_token_ttl ({}) must be shorter than auth.refresh_token_ttl ({})",
                self.access_token_ttl, self.refresh_token_ttl
            )));
        }

        let store_timeout = parse_duration(&self.store_timeout).map_err(|e| {
            AppError::configuration(format!("auth.store_timeout: {}", e.message))
        })?;

        Ok(TokenPolicy {
            secret: self.jwt_secret.clone(),
            access_ttl,
            refresh_ttl,
            store_timeout,
            revoke_on_replay: self.revoke_on_replay,
        })
    }
}

fn to_chrono(field: &str, value: &str) -> Result<chrono::Duration, AppError> {
    let std = parse_duration(value)
        .map_err(|e| AppError::configuration(format!("{field}: {}", e.message)))?;
    chrono::Duration::from_std(std)
        .map_err(|_| AppError::configuration(format!("{field}: duration '{value}' is too large")))
}

fn default_access_ttl() -> String {
    "15m".to_string()
}

fn default_refresh_ttl() -> String {
    "7d".to_string()
}

fn default_store_timeout() -> String {
    "5s".to_string()
}
