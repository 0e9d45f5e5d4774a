//! Embedded schema for the session store.

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

use warden_core::error::{AppError, ErrorKind};

/// Migrations compiled into the binary from the workspace `migrations/`.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Bring the `session_epochs` and `user_sessions` tables up to date.
///
/// Safe to call on every start; applied versions are skipped.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    let known = MIGRATOR.iter().count();
    info!(known, "Applying session store migrations");

    MIGRATOR.run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Database,
            format!("Session store migration failed: {e}"),
            e,
        )
    })?;

    info!(known, "Session store schema is current");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_schema_is_embedded() {
        assert!(MIGRATOR.iter().any(|m| m.version == 20250101000000));
    }
}
