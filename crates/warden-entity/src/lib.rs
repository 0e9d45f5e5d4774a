//! # warden-entity
//!
//! Domain models persisted or returned by the session subsystem.

pub mod session;

pub use session::{NewSessionRecord, SessionRecord, TokenPair};
