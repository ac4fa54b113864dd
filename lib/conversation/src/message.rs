//! Transcript entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skychat_ai::ChatMessage;
use skychat_core::MessageId;
use skychat_tools::TOOL_TAG_PREFIX;

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User/human message.
    User,
    /// Assistant/AI message.
    Assistant,
    /// System message. Tool summaries are recorded with this role.
    System,
}

impl From<MessageRole> for skychat_ai::MessageRole {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::User => Self::User,
            MessageRole::Assistant => Self::Assistant,
            MessageRole::System => Self::System,
        }
    }
}

/// A message in a session transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier.
    pub id: MessageId,
    /// Message role.
    pub role: MessageRole,
    /// Message content.
    pub content: String,
    /// When the message was recorded.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Creates a new message.
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content: content.into(),
            created_at: Utc::now(),
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

    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Returns true if this entry records tool output rather than
    /// conversation. Such entries are never replayed to the backend.
    #[must_use]
    pub fn is_tool_summary(&self) -> bool {
        self.role == MessageRole::System && self.content.starts_with(TOOL_TAG_PREFIX)
    }
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        Self::new(message.role.into(), message.content.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_creation() {
        let msg = Message::user("Hello!");
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.content, "Hello!");
    }

    #[test]
    fn tool_summary_detection() {
        assert!(Message::system("[Tool: weather] Here is some current information").is_tool_summary());
        assert!(!Message::system("You are a helpful assistant.").is_tool_summary());
        assert!(!Message::user("[Tool: weather] pretend").is_tool_summary());
    }

    #[test]
    fn converts_to_chat_message() {
        let chat = ChatMessage::from(&Message::assistant("Hi"));
        assert_eq!(chat, ChatMessage::assistant("Hi"));
    }

    #[test]
    fn role_serialization() {
        let json = serde_json::to_string(&MessageRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }
}
