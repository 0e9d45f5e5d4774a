//! Built-in job implementations.

pub mod session_sweep;

pub use session_sweep::SessionSweepJob;

use warden_core::error::AppError;

/// Error from job execution
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// Permanent failure — retrying will not help
    #[error("Permanent job failure: {0}")]
    Permanent(String),

    /// Transient failure — the next run may succeed
    #[error("Transient job failure: {0}")]
    Transient(String),
}

impl From<AppError> for JobExecutionError {
    fn from(err: AppError) -> Self {
        if err.is_retryable() {
            Self::Transient(err.to_string())
        } else {
            Self::Permanent(err.to_string())
        }
    }
}
