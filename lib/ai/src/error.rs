//! Error types for the AI crate.
//!
//! `LlmError` is what a chat backend reports to its caller. The
//! conversation orchestrator treats every variant as a failed turn.

use std::fmt;

/// Errors from chat backend operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// The backend could not be reached.
    ProviderUnavailable { provider: String, reason: String },
    /// The backend answered with a non-success status.
    RequestFailed { status: Option<u16>, reason: String },
    /// The response body was not a usable chat reply.
    ResponseParseFailed { reason: String },
    /// Timeout waiting for response.
    Timeout,
    /// The caller cancelled the request.
    Cancelled,
    /// Invalid configuration.
    InvalidConfig { reason: String },
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderUnavailable { provider, reason } => {
                write!(f, "LLM provider '{provider}' unavailable: {reason}")
            }
            Self::RequestFailed {
                status: Some(status),
                reason,
            } => {
                write!(f, "LLM request failed with status {status}: {reason}")
            }
            Self::RequestFailed { status: None, reason } => {
                write!(f, "LLM request failed: {reason}")
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse LLM response: {reason}")
            }
            Self::Timeout => write!(f, "LLM request timed out"),
            Self::Cancelled => write!(f, "LLM request cancelled"),
            Self::InvalidConfig { reason } => {
                write!(f, "invalid LLM configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    /// Returns true if the failure was caused by the caller's deadline or
    /// cancellation rather than by the backend.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Timeout | Self::Cancelled)
    }
}
