//! Session lifecycle: storage contract, stores and the rotation state machine.

pub mod hash;
pub mod manager;
pub mod memory;
pub mod postgres;
pub mod store;

pub use hash::hash_token;
pub use manager::{RejectReason, SessionManager};
pub use memory::MemorySessionStore;
pub use store::SessionStore;
