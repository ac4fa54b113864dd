//! Chat-completion backend for skychat.
//!
//! This crate provides:
//!
//! - **Backend trait**: the seam the conversation orchestrator calls through
//! - **Ollama client**: the `/api/chat` implementation of that trait

pub mod backend;
pub mod error;
pub mod ollama;

pub use backend::{ChatBackend, ChatMessage, ChatReply, ChatRequest, MessageRole};
pub use error::LlmError;
pub use ollama::{OllamaBackend, OllamaConfig};
