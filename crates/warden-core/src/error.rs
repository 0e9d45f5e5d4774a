//! Unified application error types for TokenWarden.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested record was not found (or is no longer active).
    NotFound,
    /// The credential is malformed, tampered with or of the wrong type.
    Authentication,
    /// The credential is correctly signed but past its expiry.
    Expired,
    /// A refresh credential could not be exchanged for a new pair.
    Rejected,
    /// A uniqueness constraint was violated.
    Conflict,
    /// The principal's sessions were revoked while a write was in flight.
    Revoked,
    /// A storage operation failed; the caller may retry.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// An internal invariant was broken.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Authentication => write!(f, "AUTHENTICATION"),
            Self::Expired => write!(f, "EXPIRED"),
            Self::Rejected => write!(f, "REJECTED"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Revoked => write!(f, "REVOKED"),
            Self::Database => write!(f, "DATABASE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout TokenWarden.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. The optional `source` carries the
/// detailed cause (for example the reason a rotation was rejected) without
/// changing the caller-visible kind.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an authentication (invalid credential) error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    /// Create an expired-credential error.
    pub fn expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Expired, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a revoked error.
    pub fn revoked(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Revoked, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether the caller must treat the request as unauthenticated.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Authentication | ErrorKind::Expired | ErrorKind::Rejected
        )
    }

    /// Whether the failure is transient and the operation may be retried.
    pub fn is_retryable(&self) -> bool {
        self.kind == ErrorKind::Database
    }

    /// Returns the typed source of this error, if it has one of type `E`.
    pub fn source_as<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref().and_then(|s| s.downcast_ref::<E>())
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("detail")]
    struct Detail;

    #[test]
    fn test_credential_kinds_are_unauthenticated() {
        assert!(AppError::authentication("bad").is_unauthenticated());
        assert!(AppError::expired("old").is_unauthenticated());
        assert!(AppError::new(ErrorKind::Rejected, "no").is_unauthenticated());
        assert!(!AppError::database("down").is_unauthenticated());
    }

    #[test]
    fn test_only_database_errors_are_retryable() {
        assert!(AppError::database("down").is_retryable());
        assert!(!AppError::expired("old").is_retryable());
        assert!(!AppError::conflict("dup").is_retryable());
    }

    #[test]
    fn test_source_as_downcasts() {
        let err = AppError::with_source(ErrorKind::Rejected, "no", Detail);
        assert!(err.source_as::<Detail>().is_some());
        assert!(err.clone().source_as::<Detail>().is_none());
        assert_eq!(err.to_string(), "REJECTED: no");
    }

    #[test]
    fn test_config_errors_map_to_configuration() {
        let err = AppError::from(config::ConfigError::Message("missing".into()));
        assert_eq!(err.kind, ErrorKind::Configuration);
        assert!(!err.is_retryable());
    }
}
