//! Stateless token codec used by the session manager.

use chrono::{DateTime, Utc};

use warden_core::error::AppError;
use warden_core::types::PrincipalId;

use super::claims::{Claims, TokenType};
use super::decoder::JwtDecoder;
use super::encoder::JwtEncoder;

/// Encodes and verifies signed, time-bounded tokens for one secret.
///
/// Holds no mutable state; safe to share across tasks.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    encoder: JwtEncoder,
    decoder: JwtDecoder,
}

impl TokenCodec {
    /// Creates a codec signing and verifying with `secret`.
    pub fn new(secret: &str) -> Self {
        Self {
            encoder: JwtEncoder::new(secret),
            decoder: JwtDecoder::new(secret),
        }
    }

    /// Encodes a token for `principal_id` valid until `expires_at`.
    pub fn encode(
        &self,
        principal_id: PrincipalId,
        token_type: TokenType,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        self.encoder
            .encode(principal_id, token_type, issued_at, expires_at)
    }

    /// Verifies `token` and returns its claims.
    ///
    /// Fails with `Authentication` for a bad signature, malformed token or
    /// wrong type, and with `Expired` for a correctly signed token whose
    /// expiry is not after `now`.
    pub fn decode(
        &self,
        token: &str,
        expected: TokenType,
        now: DateTime<Utc>,
    ) -> Result<Claims, AppError> {
        self.decoder.decode(token, expected, now)
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

    #[test]
    fn test_decode_returns_principal() {
        let codec = TokenCodec::new("s3cret");
        let token = codec
            .encode(PrincipalId(42), TokenType::Access, t0(), t0() + Duration::minutes(15))
            .unwrap();

        let claims = codec
            .decode(&token, TokenType::Access, t0() + Duration::minutes(1))
            .unwrap();

        assert_eq!(claims.principal_id(), PrincipalId(42));
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.iat, t0().timestamp());
    }

    #[test]
    fn test_expired_is_distinct_from_invalid() {
        let codec = TokenCodec::new("s3cret");
        let token = codec
            .encode(PrincipalId(1), TokenType::Access, t0(), t0() + Duration::minutes(15))
            .unwrap();

        let at_expiry = codec
            .decode(&token, TokenType::Access, t0() + Duration::minutes(15))
            .unwrap_err();
        assert_eq!(at_expiry.kind, ErrorKind::Expired);

        let tampered = format!("{token}x");
        let err = codec
            .decode(&tampered, TokenType::Access, t0())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }

    #[test]
    fn test_wrong_secret_fails_before_expiry_check() {
        let token = TokenCodec::new("s1")
            .encode(PrincipalId(1), TokenType::Access, t0(), t0() + Duration::minutes(15))
            .unwrap();

        let err = TokenCodec::new("s2")
            .decode(&token, TokenType::Access, t0() + Duration::days(1))
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Authentication);
    }

    #[test]
    fn test_token_type_is_enforced() {
        let codec = TokenCodec::new("s3cret");
        let refresh = codec
            .encode(PrincipalId(1), TokenType::Refresh, t0(), t0() + Duration::days(7))
            .unwrap();

        let err = codec
            .decode(&refresh, TokenType::Access, t0())
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Authentication);
        assert!(codec.decode(&refresh, TokenType::Refresh, t0()).is_ok());
    }

    #[test]
    fn test_same_second_tokens_differ() {
        let codec = TokenCodec::new("s3cret");
        let exp = t0() + Duration::days(7);
        let a = codec.encode(PrincipalId(1), TokenType::Refresh, t0(), exp).unwrap();
        let b = codec.encode(PrincipalId(1), TokenType::Refresh, t0(), exp).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_garbage_is_invalid() {
        let err = TokenCodec::new("s3cret")
            .decode("not-a-token", TokenType::Access, t0())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }
}
