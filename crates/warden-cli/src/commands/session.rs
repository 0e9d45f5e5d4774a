//! Session inspection and revocation commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use warden_auth::SessionManager;
use warden_core::error::AppError;
use warden_core::types::{PrincipalId, SessionId};
use warden_entity::session::SessionRecord;

/// Arguments for session commands
#[derive(Debug, Args)]
pub struct SessionArgs {
    /// Session subcommand
    #[command(subcommand)]
    pub command: SessionCommand,
}

/// Session subcommands
#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// List a principal's active sessions
    List {
        /// Principal ID
        principal: PrincipalId,
    },
    /// Revoke a single session
    Revoke {
        /// Session ID
        id: SessionId,
    },
    /// Revoke every session of a principal
    RevokeAll {
        /// Principal ID
        principal: PrincipalId,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
    /// Delete expired sessions now
    Sweep,
}

/// Session display row
#[derive(Debug, Serialize, Tabled)]
struct SessionRow {
    /// Session ID
    id: String,
    /// Principal ID
    principal_id: u64,
    /// Epoch
    epoch: i64,
    /// Created
    created_at: String,
    /// Expires
    expires_at: String,
}

impl From<&SessionRecord> for SessionRow {
    fn from(record: &SessionRecord) -> Self {
        Self {
            id: record.id.to_string(),
            principal_id: record.principal_id.get(),
            epoch: record.epoch,
            created_at: record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            expires_at: record.expires_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Execute session commands
pub async fn execute(
    args: &SessionArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let (manager, pool) = super::create_manager(&config).await?;

    let result = run(&args.command, &manager, format).await;

    pool.close().await;
    result
}

async fn run(
    command: &SessionCommand,
    manager: &SessionManager,
    format: OutputFormat,
) -> Result<(), AppError> {
    match command {
        SessionCommand::List { principal } => {
            let sessions = manager.list_active_sessions(*principal).await?;
            let rows: Vec<SessionRow> = sessions.iter().map(SessionRow::from).collect();
            output::print_list(&rows, format);
        }
        SessionCommand::Revoke { id } => {
            manager.invalidate_session(*id).await?;
            match format {
                OutputFormat::Table => output::print_success(&format!("Session {id} revoked")),
                OutputFormat::Json => output::print_json(&revoke_summary(*id)),
            }
        }
        SessionCommand::RevokeAll { principal, force } => {
            if !force {
                let confirm = dialoguer::Confirm::new()
                    .with_prompt(format!("Revoke ALL sessions of principal {principal}?"))
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

                if !confirm {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let count = manager.invalidate_all_user_sessions(*principal).await?;
            match format {
                OutputFormat::Table => output::print_success(&format!("Revoked {count} sessions")),
                OutputFormat::Json => output::print_json(&revoke_all_summary(*principal, count)),
            }
        }
        SessionCommand::Sweep => {
            let count = manager.cleanup_expired_sessions().await?;
            match format {
                OutputFormat::Table => {
                    output::print_success(&format!("Removed {count} expired sessions"))
                }
                OutputFormat::Json => output::print_json(&sweep_summary(count)),
            }
        }
    }
    Ok(())
}

fn revoke_summary(id: SessionId) -> serde_json::Value {
    serde_json::json!({ "session_id": id, "revoked": true })
}

fn revoke_all_summary(principal: PrincipalId, count: u64) -> serde_json::Value {
    serde_json::json!({ "principal_id": principal, "revoked_sessions": count })
}

fn sweep_summary(count: u64) -> serde_json::Value {
    serde_json::json!({ "expired_sessions_removed": count })
}
