//! Session store contract consumed by [`SessionManager`](super::SessionManager).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use warden_core::error::AppError;
use warden_core::types::{PrincipalId, SessionId};
use warden_entity::session::{NewSessionRecord, SessionRecord};

/// Durable record of issued refresh tokens.
///
/// Implementations must be thread-safe. `mark_used` in particular must be
/// an atomic conditional update: of several concurrent calls for the same
/// unused record, exactly one succeeds.
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    /// Returns the principal's current session epoch.
    async fn current_epoch(&self, principal_id: PrincipalId) -> Result<i64, AppError>;

    /// Inserts a record.
    ///
    /// Fails with `Conflict` when the token hash already exists and with
    /// `Revoked` when `record.epoch` is no longer the principal's epoch.
    async fn create(&self, record: NewSessionRecord) -> Result<SessionRecord, AppError>;

    /// Returns the record with `token_hash` if it is unused and unexpired
    /// at `now`; `NotFound` otherwise, whatever the reason.
    async fn get_active_by_hash(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionRecord, AppError>;

    /// Lists the principal's active records, newest first.
    async fn list_active_by_user(
        &self,
        principal_id: PrincipalId,
        now: DateTime<Utc>,
    ) -> Result<Vec<SessionRecord>, AppError>;

    /// Sets `used_at` on an unused record; `NotFound` if it was already used
    /// or does not exist.
    async fn mark_used(&self, id: SessionId, used_at: DateTime<Utc>) -> Result<(), AppError>;

    /// Bumps the principal's epoch and deletes all of its records.
    ///
    /// Returns the number of deleted records.
    async fn invalidate_all_by_user(&self, principal_id: PrincipalId) -> Result<u64, AppError>;

    /// Deletes every record with `expires_at <= now`; returns the count.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}
