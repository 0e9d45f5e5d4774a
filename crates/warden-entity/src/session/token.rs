//! Token pair returned on issuance and rotation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A freshly minted access + refresh token pair.
///
/// Tokens are opaque to callers; only the expiry timestamps are meant to
/// be read (for example to set cookie lifetimes).
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived, stateless access token.
    pub access_token: String,
    /// Long-lived, single-use refresh token.
    pub refresh_token: String,
    /// When the access token stops validating.
    pub access_expires_at: DateTime<Utc>,
    /// When the refresh token stops being redeemable.
    pub refresh_expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_expires_at", &self.access_expires_at)
            .field("refresh_expires_at", &self.refresh_expires_at)
            .finish_non_exhaustive()
    }
}
