//! Error types for the conversation crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `SessionError`: Errors from session store operations
//! - `ConversationError`: Faults inside a turn that are not backend or tool
//!   failures
//!
//! Neither reaches the caller of a turn. The orchestrator logs them and
//! answers with a generic failure.

use skychat_core::SessionId;
use std::fmt;

/// Errors from session store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Session not found.
    NotFound { id: SessionId },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { id } => write!(f, "session not found: {id}"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Unexpected faults while running a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationError {
    /// A store operation failed for this session.
    SessionOperation {
        session_id: SessionId,
        reason: String,
    },
    /// The turn panicked.
    TurnPanicked { reason: String },
}

impl fmt::Display for ConversationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionOperation { session_id, reason } => {
                write!(f, "session operation failed for {session_id}: {reason}")
            }
            Self::TurnPanicked { reason } => write!(f, "turn panicked: {reason}"),
        }
    }
}

impl std::error::Error for ConversationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_error_display() {
        let id = SessionId::new();
        let err = SessionError::NotFound { id };
        assert_eq!(err.to_string(), format!("session not found: {id}"));
    }

    #[test]
    fn conversation_error_display() {
        let err = ConversationError::SessionOperation {
            session_id: SessionId::new(),
            reason: "gone".to_string(),
        };
        assert!(err.to_string().contains("session operation failed"));
        assert!(err.to_string().ends_with(": gone"));
    }
}
