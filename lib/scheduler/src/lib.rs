//! Background maintenance for skychat.
//!
//! This crate provides:
//!
//! - **Cleanup Scheduler**: Periodic eviction of idle conversation sessions

pub mod cleanup;
pub mod error;

pub use cleanup::{CleanupConfig, CleanupScheduler};
pub use error::SchedulerError;
