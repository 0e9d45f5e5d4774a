//! One-way digest of refresh tokens.

use sha2::{Digest, Sha256};

/// Returns the lowercase hex SHA-256 digest of `token`.
///
/// Only this digest is ever persisted.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
