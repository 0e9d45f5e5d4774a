//! Token issuance, validation and rotation commands.

use clap::{Args, Subcommand};
use serde::Serialize;

use crate::output::{self, OutputFormat};
use warden_core::error::AppError;
use warden_core::types::PrincipalId;
use warden_entity::session::TokenPair;

/// Arguments for token commands
#[derive(Debug, Args)]
pub struct TokenArgs {
    /// Token subcommand
    #[command(subcommand)]
    pub command: TokenCommand,
}

/// Token subcommands
#[derive(Debug, Subcommand)]
pub enum TokenCommand {
    /// Issue a new token pair for a principal
    Issue {
        /// Principal ID
        principal: PrincipalId,
    },
    /// Validate an access token and print its principal
    Validate {
        /// Access token
        token: String,
    },
    /// Exchange a refresh token for a new pair
    Rotate {
        /// Refresh token
        token: String,
    },
}

/// Serializable view of a token pair
#[derive(Debug, Serialize)]
struct PairView<'a> {
    access_token: &'a str,
    refresh_token: &'a str,
    access_expires_at: String,
    refresh_expires_at: String,
}

impl<'a> From<&'a TokenPair> for PairView<'a> {
    fn from(pair: &'a TokenPair) -> Self {
        Self {
            access_token: &pair.access_token,
            refresh_token: &pair.refresh_token,
            access_expires_at: pair.access_expires_at.to_rfc3339(),
            refresh_expires_at: pair.refresh_expires_at.to_rfc3339(),
        }
    }
}

/// Execute token commands
pub async fn execute(
    args: &TokenArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let (manager, pool) = super::create_manager(&config).await?;

    let result = match &args.command {
        TokenCommand::Issue { principal } => manager
            .issue(*principal)
            .await
            .map(|pair| print_pair(&pair, format)),
        TokenCommand::Validate { token } => manager.validate_access(token).map(|principal| {
            match format {
                OutputFormat::Table => {
                    output::print_success("Access token is valid");
                    output::print_kv("Principal", &principal.to_string());
                }
                OutputFormat::Json => {
                    output::print_json(&serde_json::json!({ "principal_id": principal }))
                }
            }
        }),
        TokenCommand::Rotate { token } => manager
            .rotate(token)
            .await
            .map(|pair| print_pair(&pair, format)),
    };

    pool.close().await;
    result
}

fn print_pair(pair: &TokenPair, format: OutputFormat) {
    let view = PairView::from(pair);
    match format {
        OutputFormat::Table => {
            output::print_success("Token pair issued");
            output::print_kv("Access token", view.access_token);
            output::print_kv("Access expires", &view.access_expires_at);
            output::print_kv("Refresh token", view.refresh_token);
            output::print_kv("Refresh expires", &view.refresh_expires_at);
        }
        OutputFormat::Json => output::print_json(&view),
    }
}
