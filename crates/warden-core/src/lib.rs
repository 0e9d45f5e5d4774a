//! # warden-core
//!
//! Core crate for TokenWarden. Contains configuration schemas, the
//! duration-string parser, the clock abstraction, typed identifiers
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other TokenWarden crates.

pub mod clock;
pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AppError, ErrorKind};
pub use result::AppResult;
