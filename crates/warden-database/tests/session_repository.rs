//! Session repository tests against a live PostgreSQL.
//!
//! Each test connects to `DATABASE_URL`, applies the embedded migrations
//! and works on its own random principal. Without `DATABASE_URL` the tests
//! return early.

use chrono::{Duration, DurationRound, Utc};
use futures::future::join_all;
use uuid::Uuid;

use warden_core::config::DatabaseConfig;
use warden_core::error::ErrorKind;
use warden_core::types::PrincipalId;
use warden_database::{DatabasePool, SessionRepository};
use warden_entity::session::NewSessionRecord;

/// Repository bound to a migrated test database.
struct TestRepo {
    repo: SessionRepository,
    principal: PrincipalId,
}

impl TestRepo {
    async fn new() -> Option<Self> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set; skipping session repository test");
            return None;
        };

        let pool = DatabasePool::connect(&DatabaseConfig::from_url(url))
            .await
            .expect("Failed to connect to test database");
        warden_database::migration::run_migrations(pool.pool())
            .await
            .expect("Failed to run migrations");

        // Keep ids inside BIGINT range.
        let principal = PrincipalId(Uuid::new_v4().as_u64_pair().0 >> 1);
        Some(Self {
            repo: SessionRepository::new(pool.into_pool()),
            principal,
        })
    }

    fn record(&self, epoch: i64, lifetime: Duration) -> NewSessionRecord {
        let now = Utc::now()
            .duration_trunc(Duration::seconds(1))
            .expect("truncate now");
        NewSessionRecord {
            principal_id: self.principal,
            token_hash: Uuid::new_v4().simple().to_string(),
            epoch,
            expires_at: now + lifetime,
            created_at: now,
        }
    }

    async fn clean(&self) {
        self.repo
            .invalidate_all_by_user(self.principal)
            .await
            .expect("Failed to clean principal sessions");
    }
}

#[tokio::test]
async fn test_current_epoch_starts_at_zero_and_is_stable() {
    let Some(t) = TestRepo::new().await else { return };

    assert_eq!(t.repo.current_epoch(t.principal).await.unwrap(), 0);
    assert_eq!(t.repo.current_epoch(t.principal).await.unwrap(), 0);

    t.repo.invalidate_all_by_user(t.principal).await.unwrap();
    assert_eq!(t.repo.current_epoch(t.principal).await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_mark_used_has_one_winner() {
    let Some(t) = TestRepo::new().await else { return };
    let epoch = t.repo.current_epoch(t.principal).await.unwrap();
    let record = t
        .repo
        .create(&t.record(epoch, Duration::hours(1)))
        .await
        .unwrap();

    let attempts = (0..8).map(|_| {
        let repo = t.repo.clone();
        tokio::spawn(async move { repo.mark_used(record.id, Utc::now()).await })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("mark_used task panicked"))
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
    assert!(
        t.repo
            .find_active_by_hash(&record.token_hash, Utc::now())
            .await
            .unwrap()
            .is_none()
    );

    t.clean().await;
}

#[tokio::test]
async fn test_duplicate_token_hash_is_conflict() {
    let Some(t) = TestRepo::new().await else { return };
    let epoch = t.repo.current_epoch(t.principal).await.unwrap();
    let data = t.record(epoch, Duration::hours(1));

    t.repo.create(&data).await.unwrap();
    let err = t.repo.create(&data).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let active = t
        .repo
        .find_active_by_user(t.principal, Utc::now())
        .await
        .unwrap();
    assert_eq!(active.len(), 1);

    t.clean().await;
}

#[tokio::test]
async fn test_create_with_stale_epoch_is_revoked() {
    let Some(t) = TestRepo::new().await else { return };
    let stale = t.repo.current_epoch(t.principal).await.unwrap();
    t.repo
        .create(&t.record(stale, Duration::hours(1)))
        .await
        .unwrap();

    assert_eq!(t.repo.invalidate_all_by_user(t.principal).await.unwrap(), 1);

    let err = t
        .repo
        .create(&t.record(stale, Duration::hours(1)))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Revoked);
    assert!(
        t.repo
            .find_active_by_user(t.principal, Utc::now())
            .await
            .unwrap()
            .is_empty()
    );

    let fresh = t.repo.current_epoch(t.principal).await.unwrap();
    assert_eq!(fresh, stale + 1);
    let record = t
        .repo
        .create(&t.record(fresh, Duration::hours(1)))
        .await
        .unwrap();
    assert_eq!(record.epoch, fresh);

    t.clean().await;
}

#[tokio::test]
async fn test_delete_expired_twice_removes_nothing_the_second_time() {
    let Some(t) = TestRepo::new().await else { return };
    let epoch = t.repo.current_epoch(t.principal).await.unwrap();
    let expired = t
        .repo
        .create(&t.record(epoch, -Duration::minutes(1)))
        .await
        .unwrap();
    let live = t
        .repo
        .create(&t.record(epoch, Duration::hours(1)))
        .await
        .unwrap();

    let now = Utc::now();
    assert!(t.repo.delete_expired(now).await.unwrap() >= 1);
    assert_eq!(t.repo.delete_expired(now).await.unwrap(), 0);

    assert!(
        t.repo
            .find_active_by_hash(&expired.token_hash, now)
            .await
            .unwrap()
            .is_none()
    );
    let still_live = t
        .repo
        .find_active_by_hash(&live.token_hash, now)
        .await
        .unwrap();
    assert_eq!(still_live.map(|r| r.id), Some(live.id));

    t.clean().await;
}
