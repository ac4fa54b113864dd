//! Conversation sessions.

use crate::message::{Message, MessageRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skychat_core::SessionId;

/// A conversation session: the model it talks to and its transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier.
    pub id: SessionId,
    /// Model the session was created for.
    pub model: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the transcript last changed. Never moves backwards.
    pub last_updated_at: DateTime<Utc>,
    /// Transcript, oldest first.
    pub messages: Vec<Message>,
}

impl Session {
    /// Creates an empty session.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            model: model.into(),
            created_at: now,
            last_updated_at: now,
            messages: Vec::new(),
        }
    }

    /// Appends a message and refreshes `last_updated_at`.
    pub fn append(&mut self, message: Message) {
        self.last_updated_at = self.last_updated_at.max(message.created_at);
        self.messages.push(message);
    }

    /// Returns the number of transcript entries, tool summaries included.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Returns the number of user and assistant entries.
    #[must_use]
    pub fn conversation_len(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| matches!(m.role, MessageRole::User | MessageRole::Assistant))
            .count()
    }
}
