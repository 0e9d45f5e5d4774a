//! Convenience result type alias for TokenWarden.

use crate::error::AppError;

/// A specialized `Result` type for TokenWarden operations.
pub type AppResult<T> = Result<T, AppError>;
