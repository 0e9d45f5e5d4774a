//! CLI command definitions and dispatch.

pub mod migrate;
pub mod session;
pub mod token;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use warden_auth::SessionManager;
use warden_core::config::AppConfig;
use warden_core::error::AppError;
use warden_database::{DatabasePool, SessionRepository};

/// TokenWarden — session and refresh token administration
#[derive(Debug, Parser)]
#[command(name = "warden", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Issue, validate and rotate tokens
    Token(token::TokenArgs),
    /// Inspect and revoke sessions
    Session(session::SessionArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &self.config).await,
            Commands::Token(args) => token::execute(args, &self.config, self.format).await,
            Commands::Session(args) => session::execute(args, &self.config, self.format).await,
        }
    }
}

/// Helper: load configuration from file and environment
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    let env = std::env::var("WARDEN_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(config_path, &env)
}

/// Helper: connect to the database
pub async fn create_db_pool(config: &AppConfig) -> Result<DatabasePool, AppError> {
    DatabasePool::connect(&config.database).await
}

/// Helper: build a session manager over the PostgreSQL store
pub async fn create_manager(config: &AppConfig) -> Result<(SessionManager, DatabasePool), AppError> {
    let policy = config.auth.validate()?;
    let pool = create_db_pool(config).await?;
    let store = SessionRepository::new(pool.pool().clone());
    let manager = SessionManager::with_system_clock(policy, Arc::new(store));
    Ok((manager, pool))
}
