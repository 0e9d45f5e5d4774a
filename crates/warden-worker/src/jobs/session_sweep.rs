//! Expired session sweep.

use std::sync::Arc;

use serde_json::Value;

use warden_auth::SessionManager;

use super::JobExecutionError;

/// Deletes expired session records.
#[derive(Debug, Clone)]
pub struct SessionSweepJob {
    /// Session manager owning the store and clock
    manager: Arc<SessionManager>,
}

impl SessionSweepJob {
    /// Job name used in logs and summaries
    pub const NAME: &'static str = "session_sweep";

    /// Create a new sweep job
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self { manager }
    }

    /// Run one sweep and return a summary
    pub async fn run(&self) -> Result<Value, JobExecutionError> {
        tracing::debug!("Running session sweep");

        let count = self.manager.cleanup_expired_sessions().await?;

        Ok(serde_json::json!({
            "task": Self::NAME,
            "expired_sessions_removed": count,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use chrono::{DateTime, Duration};
    use warden_auth::MemorySessionStore;
    use warden_core::config::TokenPolicy;
    use warden_core::types::PrincipalId;
    use warden_core::ManualClock;

    use super::*;

    #[tokio::test]
    async fn test_sweep_reports_removed_count() {
        let clock = ManualClock::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap());
        let store = MemorySessionStore::new();
        let manager = SessionManager::new(
            TokenPolicy {
                secret: "s3cret".to_string(),
                access_ttl: Duration::minutes(15),
                refresh_ttl: Duration::hours(1),
                store_timeout: StdDuration::from_secs(5),
                revoke_on_replay: false,
            },
            Arc::new(store.clone()),
            Arc::new(clock.clone()),
        );
        manager.issue(PrincipalId(1)).await.unwrap();
        manager.issue(PrincipalId(2)).await.unwrap();

        let job = SessionSweepJob::new(Arc::new(manager));

        let summary = job.run().await.unwrap();
        assert_eq!(summary["expired_sessions_removed"], 0);

        clock.advance(Duration::hours(2));
        let summary = job.run().await.unwrap();
        assert_eq!(summary["task"], "session_sweep");
        assert_eq!(summary["expired_sessions_removed"], 2);
        assert!(store.is_empty().await);
    }

    #[test]
    fn test_retryable_errors_are_transient() {
        let err: JobExecutionError = warden_core::AppError::database("down").into();
        assert!(matches!(err, JobExecutionError::Transient(_)));

        let err: JobExecutionError = warden_core::AppError::internal("bug").into();
        assert!(matches!(err, JobExecutionError::Permanent(_)));
    }
}
