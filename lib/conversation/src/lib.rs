//! Conversation sessions and turn orchestration for skychat.
//!
//! This crate provides:
//!
//! - **Session Store**: Concurrent, time-bounded session transcripts
//! - **Orchestrator**: The per-turn protocol that merges tool output into
//!   the conversation and calls the chat backend

pub mod error;
pub mod message;
pub mod orchestrator;
pub mod session;
pub mod store;

pub use error::{ConversationError, SessionError};
pub use message::{Message, MessageRole};
pub use orchestrator::{
    ConversationOrchestrator, OrchestratorConfig, SessionHistory, TurnOutcome, TurnRequest,
};
pub use session::Session;
pub use store::{SessionStore, SessionSweeper};
