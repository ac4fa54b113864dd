//! Core domain types and utilities for skychat.
//!
//! This crate provides the identifier types and the error-handling
//! foundation shared by the conversation, tool, and AI crates.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{MessageId, ParseIdError, SessionId};
