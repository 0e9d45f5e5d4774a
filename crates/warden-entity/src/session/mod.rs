//! Session domain entities.

pub mod model;
pub mod token;

pub use model::{NewSessionRecord, SessionRecord};
pub use token::TokenPair;
