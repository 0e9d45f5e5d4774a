//! Session repository implementation.
//!
//! Every state change is a single conditional statement (or one
//! transaction) so that concurrent callers cannot interleave between a
//! read and the write that depends on it.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use warden_core::error::{AppError, ErrorKind};
use warden_core::result::AppResult;
use warden_core::types::{PrincipalId, SessionId};
use warden_entity::session::{NewSessionRecord, SessionRecord};

/// Repository for session records and principal epochs.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Return the principal's current epoch, creating it at zero if absent.
    ///
    /// A plain read once the row exists: the insert is `DO NOTHING` on
    /// conflict and the epoch is read by a separate statement, so no row is
    /// rewritten or locked.
    pub async fn current_epoch(&self, principal_id: PrincipalId) -> AppResult<i64> {
        sqlx::query(
            "INSERT INTO session_epochs (principal_id) VALUES ($1) \
             ON CONFLICT (principal_id) DO NOTHING",
        )
        .bind(principal_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to create session epoch", e)
        })?;

        sqlx::query_scalar::<_, i64>("SELECT epoch FROM session_epochs WHERE principal_id = $1")
            .bind(principal_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to read session epoch", e)
            })
    }

    /// Insert a new session record.
    ///
    /// The insert only happens while `data.epoch` is still the principal's
    /// epoch. The epoch row is share-locked for the statement, so a
    /// concurrent [`Self::invalidate_all_by_user`] either waits for this
    /// insert and then deletes the row, or commits first and makes this
    /// insert match nothing.
    pub async fn create(&self, data: &NewSessionRecord) -> AppResult<SessionRecord> {
        let inserted = sqlx::query_as::<_, SessionRecord>(
            "WITH live AS ( \
                 SELECT epoch FROM session_epochs WHERE principal_id = $2 FOR SHARE \
             ) \
             INSERT INTO user_sessions (id, principal_id, token_hash, epoch, expires_at, created_at) \
             SELECT $1, $2, $3, $4, $5, $6 FROM live WHERE live.epoch = $4 \
             RETURNING id, principal_id, token_hash, epoch, expires_at, used_at, created_at",
        )
        .bind(SessionId::new())
        .bind(data.principal_id)
        .bind(&data.token_hash)
        .bind(data.epoch)
        .bind(data.expires_at)
        .bind(data.created_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            let duplicate = matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation());
            if duplicate {
                AppError::with_source(
                    ErrorKind::Conflict,
                    "Session with this token hash already exists",
                    e,
                )
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to create session", e)
            }
        })?;

        inserted.ok_or_else(|| {
            AppError::revoked(format!(
                "Sessions of principal {} were revoked (epoch {} is stale)",
                data.principal_id, data.epoch
            ))
        })
    }

    /// Find a redeemable record by token hash.
    pub async fn find_active_by_hash(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<SessionRecord>> {
        sqlx::query_as::<_, SessionRecord>(
            "SELECT id, principal_id, token_hash, epoch, expires_at, used_at, created_at \
             FROM user_sessions \
             WHERE token_hash = $1 AND used_at IS NULL AND expires_at > $2",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find session by hash", e)
        })
    }

    /// List the principal's redeemable records, newest first.
    pub async fn find_active_by_user(
        &self,
        principal_id: PrincipalId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<SessionRecord>> {
        sqlx::query_as::<_, SessionRecord>(
            "SELECT id, principal_id, token_hash, epoch, expires_at, used_at, created_at \
             FROM user_sessions \
             WHERE principal_id = $1 AND used_at IS NULL AND expires_at > $2 \
             ORDER BY created_at DESC",
        )
        .bind(principal_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find active sessions", e)
        })
    }

    /// Set `used_at` on a record that has not been used yet.
    ///
    /// Conditional on `used_at IS NULL`; when zero rows change the record
    /// was already used (or never existed) and `NotFound` is returned.
    pub async fn mark_used(&self, id: SessionId, used_at: DateTime<Utc>) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE user_sessions SET used_at = $2 WHERE id = $1 AND used_at IS NULL",
        )
        .bind(id)
        .bind(used_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark session used", e)
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Unused session {id} not found"
            )));
        }
        Ok(())
    }

    /// Bump the principal's epoch and delete all of its records.
    ///
    /// Returns the number of deleted records; zero is not an error.
    pub async fn invalidate_all_by_user(&self, principal_id: PrincipalId) -> AppResult<u64> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        sqlx::query(
            "INSERT INTO session_epochs (principal_id, epoch) VALUES ($1, 1) \
             ON CONFLICT (principal_id) DO UPDATE SET epoch = session_epochs.epoch + 1",
        )
        .bind(principal_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to bump session epoch", e)
        })?;

        let result = sqlx::query("DELETE FROM user_sessions WHERE principal_id = $1")
            .bind(principal_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to invalidate user sessions", e)
            })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit invalidation", e)
        })?;

        Ok(result.rows_affected())
    }

    /// Delete every record whose expiry is at or before `now`.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete expired sessions", e)
            })?;

        Ok(result.rows_affected())
    }
}
