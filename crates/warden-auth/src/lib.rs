//! # warden-auth
//!
//! Credential issuance, validation and rotation for TokenWarden.
//!
//! ## Modules
//!
//! - `jwt` — signed access/refresh token encoding and verification
//! - `session` — session stores (PostgreSQL, in-memory) and the
//!   [`SessionManager`] that issues, rotates and revokes refresh tokens

pub mod jwt;
pub mod session;

pub use jwt::{Claims, TokenCodec, TokenType};
pub use session::{MemorySessionStore, RejectReason, SessionManager, SessionStore};
