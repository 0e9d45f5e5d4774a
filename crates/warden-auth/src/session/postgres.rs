//! [`SessionStore`] backed by PostgreSQL through [`SessionRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use warden_core::error::AppError;
use warden_core::types::{PrincipalId, SessionId};
use warden_database::repositories::SessionRepository;
use warden_entity::session::{NewSessionRecord, SessionRecord};

use super::store::SessionStore;

#[async_trait]
impl SessionStore for SessionRepository {
    async fn current_epoch(&self, principal_id: PrincipalId) -> Result<i64, AppError> {
        SessionRepository::current_epoch(self, principal_id).await
    }

    async fn create(&self, record: NewSessionRecord) -> Result<SessionRecord, AppError> {
        SessionRepository::create(self, &record).await
    }

    async fn get_active_by_hash(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionRecord, AppError> {
        self.find_active_by_hash(token_hash, now)
            .await?
            .ok_or_else(|| AppError::not_found("Session not found or expired"))
    }

    async fn list_active_by_user(
        &self,
        principal_id: PrincipalId,
        now: DateTime<Utc>,
    ) -> Result<Vec<SessionRecord>, AppError> {
        self.find_active_by_user(principal_id, now).await
    }

    async fn mark_used(&self, id: SessionId, used_at: DateTime<Utc>) -> Result<(), AppError> {
        SessionRepository::mark_used(self, id, used_at).await
    }

    async fn invalidate_all_by_user(&self, principal_id: PrincipalId) -> Result<u64, AppError> {
        SessionRepository::invalidate_all_by_user(self, principal_id).await
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        SessionRepository::delete_expired(self, now).await
    }
}
