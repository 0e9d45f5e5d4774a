//! TokenWarden Server — session and refresh token service
//!
//! Main entry point that wires the crates together, keeps the expiry sweep
//! running and waits for a shutdown signal.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use warden_auth::SessionManager;
use warden_core::config::AppConfig;
use warden_core::error::AppError;
use warden_database::{DatabasePool, SessionRepository};
use warden_worker::{SessionSweepJob, SweepScheduler};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(kind = %e.kind, "Server error: {}", e.message);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("WARDEN_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());

    let env = std::env::var("WARDEN_ENV").unwrap_or_else(|_| "development".to_string());

    AppConfig::load(&config_path, &env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting TokenWarden v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Validate token policy ────────────────────────────
    let policy = config.auth.validate()?;
    tracing::info!(?policy, "Token policy loaded");

    // ── Step 2: Database connection + migrations ─────────────────
    let db_pool = DatabasePool::connect(&config.database).await?;
    warden_database::migration::run_migrations(db_pool.pool()).await?;

    // ── Step 3: Session manager ──────────────────────────────────
    let store = SessionRepository::new(db_pool.pool().clone());
    let manager = Arc::new(SessionManager::with_system_clock(policy, Arc::new(store)));

    // ── Step 4: Expiry sweep ─────────────────────────────────────
    let mut scheduler = if config.worker.enabled {
        let scheduler = SweepScheduler::new(SessionSweepJob::new(Arc::clone(&manager))).await?;
        if config.worker.sweep_on_startup {
            scheduler.run_now().await;
        }
        scheduler
            .register_session_sweep(&config.worker.sweep_schedule)
            .await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Session sweep disabled");
        None
    };

    tracing::info!("TokenWarden ready");

    // ── Step 5: Graceful shutdown ────────────────────────────────
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, stopping...");

    if let Some(scheduler) = scheduler.as_mut() {
        if let Err(e) = scheduler.shutdown().await {
            tracing::warn!(error = %e, "Scheduler did not shut down cleanly");
        }
    }

    db_pool.close().await;
    tracing::info!("TokenWarden stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
