//! # warden-database
//!
//! PostgreSQL connection management, embedded migrations and the
//! concrete session repository.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::SessionRepository;
