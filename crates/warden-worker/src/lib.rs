//! Background maintenance for TokenWarden.
//!
//! This crate provides:
//! - A cron scheduler driving periodic maintenance
//! - The expired-session sweep job

pub mod jobs;
pub mod scheduler;

pub use jobs::{JobExecutionError, SessionSweepJob};
pub use scheduler::SweepScheduler;
