//! Chat backend abstraction.
//!
//! Mirrors the shape of Ollama's non-streaming `/api/chat` exchange, which
//! is the only wire format the orchestrator needs.

use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The role of a message sender, as understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User/human message.
    User,
    /// Assistant/AI message.
    Assistant,
    /// System message.
    System,
}

/// A single message sent to or received from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content of the message.
    pub content: String,
}

impl ChatMessage {
    /// Creates a message with the given role.
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// A chat completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation so far, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Always false; replies are read as a single document.
    pub stream: bool,
}

impl ChatRequest {
    /// Creates a non-streaming request.
    #[must_use]
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: false,
        }
    }
}

/// A successful chat completion.
///
/// Timing fields are reported by Ollama in nanoseconds and are optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Model that generated the response.
    pub model: String,
    /// The generated message.
    pub message: ChatMessage,
    /// Whether generation finished.
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_duration: Option<u64>,
}

impl ChatReply {
    /// Returns the reply text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.message.content
    }
}

/// Trait for chat backends.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Sends the conversation and returns the assistant's reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable, answers with a
    /// non-success status, or returns a body without a reply message.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_in_wire_shape() {
        let request = ChatRequest::new(
            "llama3.2:latest",
            vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")],
        );

        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "model": "llama3.2:latest",
                "messages": [
                    {"role": "user", "content": "hi"},
                    {"role": "assistant", "content": "hello"}
                ],
                "stream": false
            })
        );
    }

    #[test]
    fn reply_parses_with_timings() {
        let reply: ChatReply = serde_json::from_value(serde_json::json!({
            "model": "llama3.2:latest",
            "created_at": "2024-05-01T12:00:00Z",
            "message": {"role": "assistant", "content": "It is sunny."},
            "done": true,
            "done_reason": "stop",
            "total_duration": 5_000_000_000u64,
            "eval_count": 12
        }))
        .expect("deserialize");

        assert_eq!(reply.content(), "It is sunny.");
        assert!(reply.done);
        assert_eq!(reply.done_reason.as_deref(), Some("stop"));
        assert_eq!(reply.eval_count, Some(12));
        assert_eq!(reply.load_duration, None);
    }

    #[test]
    fn reply_without_message_is_rejected() {
        let parsed = serde_json::from_value::<ChatReply>(serde_json::json!({
            "model": "llama3.2:latest",
            "done": true
        }));
        assert!(parsed.is_err());
    }
}
