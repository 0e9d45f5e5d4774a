//! In-memory session store using a Tokio mutex for single-node use and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use warden_core::error::AppError;
use warden_core::types::{PrincipalId, SessionId};
use warden_entity::session::{NewSessionRecord, SessionRecord};

use super::store::SessionStore;

/// Internal state for the memory-based store.
#[derive(Debug, Default)]
struct InnerState {
    /// Records by ID.
    records: HashMap<SessionId, SessionRecord>,
    /// Token hash index; enforces hash uniqueness.
    by_hash: HashMap<String, SessionId>,
    /// Current epoch per principal; absent means zero.
    epochs: HashMap<PrincipalId, i64>,
}

impl InnerState {
    fn epoch_of(&self, principal_id: PrincipalId) -> i64 {
        self.epochs.get(&principal_id).copied().unwrap_or(0)
    }

    fn remove(&mut self, id: &SessionId) {
        if let Some(record) = self.records.remove(id) {
            self.by_hash.remove(&record.token_hash);
        }
    }
}

/// In-memory session store.
///
/// Every operation runs under one lock, which makes `mark_used` and the
/// epoch check in `create` trivially atomic. Not durable; suitable for a
/// single process only.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    /// Protected inner state.
    state: Arc<Mutex<InnerState>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held, in any state.
    pub async fn len(&self) -> usize {
        self.state.lock().await.records.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Returns the record with `token_hash` regardless of its state.
    pub async fn find_by_hash(&self, token_hash: &str) -> Option<SessionRecord> {
        let state = self.state.lock().await;
        state
            .by_hash
            .get(token_hash)
            .and_then(|id| state.records.get(id))
            .cloned()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn current_epoch(&self, principal_id: PrincipalId) -> Result<i64, AppError> {
        Ok(self.state.lock().await.epoch_of(principal_id))
    }

    async fn create(&self, record: NewSessionRecord) -> Result<SessionRecord, AppError> {
        let mut state = self.state.lock().await;

        if state.epoch_of(record.principal_id) != record.epoch {
            return Err(AppError::revoked(format!(
                "Sessions of principal {} were revoked (epoch {} is stale)",
                record.principal_id, record.epoch
            )));
        }

        if state.by_hash.contains_key(&record.token_hash) {
            return Err(AppError::conflict(
                "Session with this token hash already exists",
            ));
        }

        let created = SessionRecord {
            id: SessionId::new(),
            principal_id: record.principal_id,
            token_hash: record.token_hash,
            epoch: record.epoch,
            expires_at: record.expires_at,
            used_at: None,
            created_at: record.created_at,
        };

        state.by_hash.insert(created.token_hash.clone(), created.id);
        state.records.insert(created.id, created.clone());

        Ok(created)
    }

    async fn get_active_by_hash(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionRecord, AppError> {
        let state = self.state.lock().await;
        state
            .by_hash
            .get(token_hash)
            .and_then(|id| state.records.get(id))
            .filter(|r| r.is_active_at(now))
            .cloned()
            .ok_or_else(|| AppError::not_found("Session not found or expired"))
    }

    async fn list_active_by_user(
        &self,
        principal_id: PrincipalId,
        now: DateTime<Utc>,
    ) -> Result<Vec<SessionRecord>, AppError> {
        let state = self.state.lock().await;
        let mut active: Vec<SessionRecord> = state
            .records
            .values()
            .filter(|r| r.principal_id == principal_id && r.is_active_at(now))
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(active)
    }

    async fn mark_used(&self, id: SessionId, used_at: DateTime<Utc>) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        match state.records.get_mut(&id) {
            Some(record) if record.used_at.is_none() => {
                record.used_at = Some(used_at);
                Ok(())
            }
            _ => Err(AppError::not_found(format!("Unused session {id} not found"))),
        }
    }

    async fn invalidate_all_by_user(&self, principal_id: PrincipalId) -> Result<u64, AppError> {
        let mut state = self.state.lock().await;
        *state.epochs.entry(principal_id).or_insert(0) += 1;

        let ids: Vec<SessionId> = state
            .records
            .values()
            .filter(|r| r.principal_id == principal_id)
            .map(|r| r.id)
            .collect();

        for id in &ids {
            state.remove(id);
        }

        Ok(ids.len() as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut state = self.state.lock().await;
        let ids: Vec<SessionId> = state
            .records
            .values()
            .filter(|r| r.is_expired_at(now))
            .map(|r| r.id)
            .collect();

        for id in &ids {
            state.remove(id);
        }

        Ok(ids.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use warden_core::error::ErrorKind;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn new_record(principal: u64, hash: &str, epoch: i64) -> NewSessionRecord {
        NewSessionRecord {
            principal_id: PrincipalId(principal),
            token_hash: hash.to_string(),
            epoch,
            expires_at: t0() + Duration::days(7),
            created_at: t0(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_hash_is_conflict() {
        let store = MemorySessionStore::new();
        store.create(new_record(1, "h1", 0)).await.unwrap();

        let err = store.create(new_record(2, "h1", 0)).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_mark_used_wins_once() {
        let store = MemorySessionStore::new();
        let record = store.create(new_record(1, "h1", 0)).await.unwrap();

        store.mark_used(record.id, t0()).await.unwrap();
        let err = store.mark_used(record.id, t0()).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_used_and_expired_records_are_not_found() {
        let store = MemorySessionStore::new();
        let used = store.create(new_record(1, "used", 0)).await.unwrap();
        store.create(new_record(1, "live", 0)).await.unwrap();
        store.mark_used(used.id, t0()).await.unwrap();

        let err = store.get_active_by_hash("used", t0()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let err = store
            .get_active_by_hash("live", t0() + Duration::days(7))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let err = store.get_active_by_hash("never", t0()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        assert!(store.get_active_by_hash("live", t0()).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalidate_bumps_epoch_and_refuses_stale_inserts() {
        let store = MemorySessionStore::new();
        store.create(new_record(1, "a", 0)).await.unwrap();
        store.create(new_record(2, "b", 0)).await.unwrap();

        assert_eq!(store.invalidate_all_by_user(PrincipalId(1)).await.unwrap(), 1);
        assert_eq!(store.current_epoch(PrincipalId(1)).await.unwrap(), 1);
        assert_eq!(store.current_epoch(PrincipalId(2)).await.unwrap(), 0);

        let err = store.create(new_record(1, "c", 0)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Revoked);
        assert!(store.create(new_record(1, "c", 1)).await.is_ok());

        assert_eq!(store.invalidate_all_by_user(PrincipalId(9)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_expired_only_touches_expired_rows() {
        let store = MemorySessionStore::new();
        store.create(new_record(1, "a", 0)).await.unwrap();
        let mut short = new_record(1, "b", 0);
        short.expires_at = t0() + Duration::hours(1);
        store.create(short).await.unwrap();

        let now = t0() + Duration::hours(1);
        assert_eq!(store.delete_expired(now).await.unwrap(), 1);
        assert_eq!(store.delete_expired(now).await.unwrap(), 0);
        assert!(store.find_by_hash("a").await.is_some());
        assert!(store.find_by_hash("b").await.is_none());
    }

    #[tokio::test]
    async fn test_list_active_is_newest_first() {
        let store = MemorySessionStore::new();
        store.create(new_record(1, "old", 0)).await.unwrap();
        let mut newer = new_record(1, "new", 0);
        newer.created_at = t0() + Duration::minutes(5);
        store.create(newer).await.unwrap();
        store.create(new_record(2, "other", 0)).await.unwrap();

        let listed = store.list_active_by_user(PrincipalId(1), t0()).await.unwrap();

        let hashes: Vec<&str> = listed.iter().map(|r| r.token_hash.as_str()).collect();
        assert_eq!(hashes, vec!["new", "old"]);
    }
}
