//! Session record entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use warden_core::types::{PrincipalId, SessionId};

/// One issued refresh token.
///
/// Created on issuance, marked used once on redemption, and deleted by the
/// expiry sweep or by revoking all of the principal's sessions. No other
/// mutation exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SessionRecord {
    /// Unique, server-generated identifier.
    pub id: SessionId,
    /// Owner of the refresh token.
    pub principal_id: PrincipalId,
    /// Hex SHA-256 digest of the raw refresh token. The raw token is never stored.
    pub token_hash: String,
    /// Principal session epoch current when the record was created.
    pub epoch: i64,
    /// Issuance time plus the refresh lifetime.
    pub expires_at: DateTime<Utc>,
    /// Set once when the token is redeemed; `None` means still redeemable.
    pub used_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Whether the record may still be redeemed at `now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && self.expires_at > now
    }

    /// Whether the refresh token has already been exchanged.
    pub fn is_used(&self) -> bool {
        self.used_at.is_some()
    }

    /// Whether the record is past its expiry at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Data required to create a new session record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSessionRecord {
    /// Owner of the refresh token.
    pub principal_id: PrincipalId,
    /// Hex SHA-256 digest of the raw refresh token.
    pub token_hash: String,
    /// Epoch the record belongs to; the insert fails if it is no longer current.
    pub epoch: i64,
    /// Absolute expiry.
    pub expires_at: DateTime<Utc>,
    /// Issuance instant.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(used_at: Option<DateTime<Utc>>) -> SessionRecord {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        SessionRecord {
            id: SessionId::new(),
            principal_id: PrincipalId(42),
            token_hash: "ab".repeat(32),
            epoch: 0,
            expires_at: now + Duration::days(7),
            used_at,
            created_at: now,
        }
    }

    #[test]
    fn test_unused_unexpired_record_is_active() {
        let r = record(None);
        assert!(r.is_active_at(r.created_at + Duration::minutes(1)));
    }

    #[test]
    fn test_used_record_is_never_active() {
        let r = record(Some(DateTime::from_timestamp(1_700_000_060, 0).unwrap()));
        assert!(r.is_used());
        assert!(!r.is_active_at(r.created_at));
    }

    #[test]
    fn test_record_is_inactive_at_exact_expiry() {
        let r = record(None);
        assert!(r.is_expired_at(r.expires_at));
        assert!(!r.is_active_at(r.expires_at));
    }

    #[test]
    fn test_serializes_ids_transparently() {
        let r = record(None);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["principal_id"], 42);
        assert!(json["id"].is_string());
    }
}
