//! Cron scheduler for the session sweep.

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use warden_core::error::AppError;

use crate::jobs::SessionSweepJob;

/// Cron-based scheduler running the expired-session sweep
pub struct SweepScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// Sweep job shared with every scheduled run
    job: SessionSweepJob,
}

impl std::fmt::Debug for SweepScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepScheduler")
            .field("job", &self.job)
            .finish()
    }
}

impl SweepScheduler {
    /// Create a new scheduler for `job`
    pub async fn new(job: SessionSweepJob) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self { scheduler, job })
    }

    /// Run the sweep once, outside the schedule
    ///
    /// Failures are logged and swallowed; the server keeps starting.
    pub async fn run_now(&self) {
        run_sweep(&self.job).await;
    }

    /// Register the sweep on a six-field cron expression (seconds first)
    pub async fn register_session_sweep(&self, schedule: &str) -> Result<(), AppError> {
        let job = self.job.clone();
        let cron_job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let job = job.clone();
            Box::pin(async move {
                run_sweep(&job).await;
            })
        })
        .map_err(|e| {
            AppError::configuration(format!(
                "Invalid worker.sweep_schedule '{schedule}': {e}"
            ))
        })?;

        self.scheduler.add(cron_job).await.map_err(|e| {
            AppError::internal(format!("Failed to add session_sweep schedule: {e}"))
        })?;

        tracing::info!(schedule, "Registered: session_sweep");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        tracing::info!("Sweep scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        tracing::info!("Sweep scheduler shut down");
        Ok(())
    }
}

async fn run_sweep(job: &SessionSweepJob) {
    match job.run().await {
        Ok(summary) => tracing::debug!(%summary, "Session sweep finished"),
        Err(e) => tracing::error!(error = %e, "Session sweep failed"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration as StdDuration;

    use chrono::Duration;
    use warden_auth::{MemorySessionStore, SessionManager};
    use warden_core::config::TokenPolicy;
    use warden_core::error::ErrorKind;

    use super::*;

    fn job() -> SessionSweepJob {
        let manager = SessionManager::with_system_clock(
            TokenPolicy {
                secret: "s3cret".to_string(),
                access_ttl: Duration::minutes(15),
                refresh_ttl: Duration::days(7),
                store_timeout: StdDuration::from_secs(5),
                revoke_on_replay: false,
            },
            Arc::new(MemorySessionStore::new()),
        );
        SessionSweepJob::new(Arc::new(manager))
    }

    #[tokio::test]
    async fn test_register_accepts_default_schedule() {
        let scheduler = SweepScheduler::new(job()).await.unwrap();
        assert!(scheduler.register_session_sweep("0 */15 * * * *").await.is_ok());
    }

    #[tokio::test]
    async fn test_register_rejects_bad_schedule() {
        let scheduler = SweepScheduler::new(job()).await.unwrap();
        let err = scheduler
            .register_session_sweep("every fifteen minutes")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
