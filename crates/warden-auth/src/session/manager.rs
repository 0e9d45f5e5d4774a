//! Session lifecycle manager — issuance, validation, rotation and revocation.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use warden_core::clock::{Clock, SystemClock};
use warden_core::config::TokenPolicy;
use warden_core::error::{AppError, ErrorKind};
use warden_core::types::{PrincipalId, SessionId};
use warden_entity::session::{NewSessionRecord, SessionRecord, TokenPair};

use crate::jwt::{TokenCodec, TokenType};

use super::hash::hash_token;
use super::store::SessionStore;

/// Message shared by every rejected rotation.
const REJECTED_MESSAGE: &str = "Session not found or expired";

/// Epoch reads per `issue` before giving up to a concurrent revocation.
const ISSUE_ATTEMPTS: u32 = 2;

/// Why a refresh token was refused.
///
/// Attached as the source of the `Rejected` error for logging and tests;
/// callers only ever see [`REJECTED_MESSAGE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// Bad signature, malformed, or not a refresh token.
    #[error("refresh token is invalid")]
    InvalidToken,
    /// Correctly signed but past its expiry.
    #[error("refresh token has expired")]
    ExpiredToken,
    /// Token decodes but has no active record: used, expired or revoked.
    #[error("refresh token has no active session (replay)")]
    Replayed,
    /// The fetched record was already used.
    #[error("session was already used")]
    AlreadyUsed,
    /// The fetched record was already expired.
    #[error("session has expired")]
    SessionExpired,
    /// The record belongs to a different principal than the token.
    #[error("session principal does not match token")]
    PrincipalMismatch,
    /// A concurrent rotation redeemed the record first.
    #[error("session was redeemed concurrently")]
    LostRace,
    /// The principal's sessions were revoked while rotating.
    #[error("sessions were revoked during rotation")]
    Revoked,
}

impl RejectReason {
    fn into_error(self) -> AppError {
        AppError::with_source(ErrorKind::Rejected, REJECTED_MESSAGE, self)
    }
}

/// Issues, rotates and revokes session credentials.
///
/// Access tokens are verified by the codec alone. Refresh tokens are
/// backed by one [`SessionRecord`] each and can be redeemed exactly once.
#[derive(Clone)]
pub struct SessionManager {
    /// Token codec for the configured secret.
    codec: Arc<TokenCodec>,
    /// Session persistence.
    store: Arc<dyn SessionStore>,
    /// Time source for issuance and expiry checks.
    clock: Arc<dyn Clock>,
    /// Validated lifetimes and flags.
    policy: TokenPolicy,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("store", &self.store)
            .field("policy", &self.policy)
            .finish()
    }
}

impl SessionManager {
    /// Creates a manager over `store`, reading time from `clock`.
    pub fn new(policy: TokenPolicy, store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            codec: Arc::new(TokenCodec::new(&policy.secret)),
            store,
            clock,
            policy,
        }
    }

    /// Creates a manager using the system clock.
    pub fn with_system_clock(policy: TokenPolicy, store: Arc<dyn SessionStore>) -> Self {
        Self::new(policy, store, Arc::new(SystemClock))
    }

    /// Returns the active policy.
    pub fn policy(&self) -> &TokenPolicy {
        &self.policy
    }

    /// Issues a new access + refresh pair for `principal_id`.
    ///
    /// A revocation landing between the epoch read and the insert makes the
    /// insert stale; the epoch is re-read once. If that also loses, the
    /// failure is reported as a retryable `Database` error.
    pub async fn issue(&self, principal_id: PrincipalId) -> Result<TokenPair, AppError> {
        let mut last_revoked = None;

        for attempt in 1..=ISSUE_ATTEMPTS {
            let epoch = self
                .with_deadline("current_epoch", self.store.current_epoch(principal_id))
                .await?;

            match self.issue_at_epoch(principal_id, epoch).await {
                Err(e) if e.kind == ErrorKind::Revoked => {
                    debug!(
                        principal_id = %principal_id,
                        epoch,
                        attempt,
                        "Sessions revoked during issue; re-reading epoch"
                    );
                    last_revoked = Some(e);
                }
                other => return other,
            }
        }

        warn!(principal_id = %principal_id, "Issue kept losing to session revocation");
        let message = "Sessions were revoked concurrently; retry the login";
        Err(match last_revoked {
            Some(e) => AppError::with_source(ErrorKind::Database, message, e),
            None => AppError::database(message),
        })
    }

    /// Verifies an access token and returns its principal.
    ///
    /// Stateless: no store lookup. Fails with `Authentication` or `Expired`.
    pub fn validate_access(&self, token: &str) -> Result<PrincipalId, AppError> {
        let claims = self
            .codec
            .decode(token, TokenType::Access, self.clock.now())
            .inspect_err(|e| debug!(kind = %e.kind, "Access token rejected"))?;

        Ok(claims.principal_id())
    }

    /// Alias of [`Self::validate_access`].
    pub fn principal_from_token(&self, token: &str) -> Result<PrincipalId, AppError> {
        self.validate_access(token)
    }

    /// Exchanges a refresh token for a new pair.
    ///
    /// Every refusal is a `Rejected` error with the same message; the
    /// [`RejectReason`] is its source. Storage failures keep their own
    /// kind and are never reported as rejections.
    pub async fn rotate(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let now = self.clock.now();

        // Step 1: Decode the refresh token
        let claims = self
            .codec
            .decode(refresh_token, TokenType::Refresh, now)
            .map_err(|e| {
                let reason = if e.kind == ErrorKind::Expired {
                    RejectReason::ExpiredToken
                } else {
                    RejectReason::InvalidToken
                };
                debug!(reason = %reason, "Refresh token rejected");
                reason.into_error()
            })?;
        let principal_id = claims.principal_id();

        // Step 2: Find the active record for this token
        let token_hash = hash_token(refresh_token);
        let record = match self
            .with_deadline(
                "get_active_by_hash",
                self.store.get_active_by_hash(&token_hash, now),
            )
            .await
        {
            Ok(record) => record,
            Err(e) if e.kind == ErrorKind::NotFound => {
                warn!(
                    principal_id = %principal_id,
                    jti = %claims.jti,
                    "Refresh token replay detected"
                );
                if self.policy.revoke_on_replay {
                    self.revoke_after_replay(principal_id).await;
                }
                return Err(RejectReason::Replayed.into_error());
            }
            Err(e) => return Err(e),
        };

        // Step 3: Re-check the record in case the store did not filter it
        if let Some(reason) = Self::recheck(&record, principal_id, now) {
            warn!(
                principal_id = %principal_id,
                session_id = %record.id,
                reason = %reason,
                "Store returned an inactive session"
            );
            return Err(reason.into_error());
        }

        // Step 4: Redeem the record; only one concurrent caller can win
        match self
            .with_deadline("mark_used", self.store.mark_used(record.id, now))
            .await
        {
            Ok(()) => {}
            Err(e) if e.kind == ErrorKind::NotFound => {
                warn!(
                    principal_id = %principal_id,
                    session_id = %record.id,
                    "Refresh token redeemed concurrently"
                );
                return Err(RejectReason::LostRace.into_error());
            }
            Err(e) => return Err(e),
        }

        // Step 5: Mint the next pair within the redeemed record's epoch
        match self.issue_at_epoch(record.principal_id, record.epoch).await {
            Ok(pair) => {
                info!(
                    principal_id = %principal_id,
                    redeemed_session_id = %record.id,
                    "Session rotated"
                );
                Ok(pair)
            }
            Err(e) if e.kind == ErrorKind::Revoked => {
                warn!(
                    principal_id = %principal_id,
                    session_id = %record.id,
                    "Sessions revoked during rotation"
                );
                Err(RejectReason::Revoked.into_error())
            }
            Err(e) => Err(e),
        }
    }

    /// Revokes every session of `principal_id`; returns the deleted count.
    ///
    /// Any rotation still in flight for the principal will fail.
    pub async fn invalidate_all_user_sessions(
        &self,
        principal_id: PrincipalId,
    ) -> Result<u64, AppError> {
        let count = self
            .with_deadline(
                "invalidate_all_by_user",
                self.store.invalidate_all_by_user(principal_id),
            )
            .await?;

        info!(principal_id = %principal_id, count, "All user sessions invalidated");
        Ok(count)
    }

    /// Revokes one session without issuing anything.
    ///
    /// Fails with `NotFound` if the session does not exist or is already used.
    pub async fn invalidate_session(&self, session_id: SessionId) -> Result<(), AppError> {
        let now = self.clock.now();
        self.with_deadline("mark_used", self.store.mark_used(session_id, now))
            .await?;

        info!(session_id = %session_id, "Session invalidated");
        Ok(())
    }

    /// Deletes every expired record; returns the deleted count.
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, AppError> {
        let now = self.clock.now();
        let count = self
            .with_deadline("delete_expired", self.store.delete_expired(now))
            .await?;

        if count > 0 {
            info!(count, "Expired sessions cleaned up");
        } else {
            debug!("No expired sessions to clean up");
        }
        Ok(count)
    }

    /// Lists the principal's redeemable sessions, newest first.
    pub async fn list_active_sessions(
        &self,
        principal_id: PrincipalId,
    ) -> Result<Vec<SessionRecord>, AppError> {
        let now = self.clock.now();
        self.with_deadline(
            "list_active_by_user",
            self.store.list_active_by_user(principal_id, now),
        )
        .await
    }

    async fn issue_at_epoch(
        &self,
        principal_id: PrincipalId,
        epoch: i64,
    ) -> Result<TokenPair, AppError> {
        // Tokens carry whole seconds; keep the record in step with them.
        let now = self.clock.now().trunc_subsecs(0);
        let access_expires_at = now + self.policy.access_ttl;
        let refresh_expires_at = now + self.policy.refresh_ttl;

        let access_token =
            self.codec
                .encode(principal_id, TokenType::Access, now, access_expires_at)?;
        let refresh_token =
            self.codec
                .encode(principal_id, TokenType::Refresh, now, refresh_expires_at)?;

        let record = NewSessionRecord {
            principal_id,
            token_hash: hash_token(&refresh_token),
            epoch,
            expires_at: refresh_expires_at,
            created_at: now,
        };

        let created = match self.with_deadline("create", self.store.create(record)).await {
            Ok(created) => created,
            Err(e) if e.kind == ErrorKind::Conflict => {
                error!(
                    principal_id = %principal_id,
                    "Refresh token hash collision on insert"
                );
                return Err(AppError::with_source(
                    ErrorKind::Internal,
                    "Refresh token hash collision",
                    e,
                ));
            }
            Err(e) => return Err(e),
        };

        debug!(
            principal_id = %principal_id,
            session_id = %created.id,
            epoch,
            "Session issued"
        );

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
        })
    }

    fn recheck(
        record: &SessionRecord,
        principal_id: PrincipalId,
        now: DateTime<Utc>,
    ) -> Option<RejectReason> {
        if record.is_used() {
            Some(RejectReason::AlreadyUsed)
        } else if record.is_expired_at(now) {
            Some(RejectReason::SessionExpired)
        } else if record.principal_id != principal_id {
            Some(RejectReason::PrincipalMismatch)
        } else {
            None
        }
    }

    async fn revoke_after_replay(&self, principal_id: PrincipalId) {
        match self.invalidate_all_user_sessions(principal_id).await {
            Ok(count) => warn!(
                principal_id = %principal_id,
                count,
                "Revoked all sessions after refresh token replay"
            ),
            Err(e) => error!(
                principal_id = %principal_id,
                error = %e,
                "Failed to revoke sessions after refresh token replay"
            ),
        }
    }

    /// Runs a store call under the configured store timeout.
    async fn with_deadline<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, AppError>>,
    ) -> Result<T, AppError> {
        let timeout = self.policy.store_timeout;
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, ?timeout, "Session store call timed out");
                Err(AppError::database(format!(
                    "Session store call '{operation}' timed out after {timeout:?}"
                )))
            }
        }
    }
}
