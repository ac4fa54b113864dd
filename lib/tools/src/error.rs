//! Error types for the tools crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `WeatherError`: Errors from the wttr.in client
//! - `ToolError`: Errors an adapter reports to the executor
//!
//! Neither crosses the executor boundary; both end up as the `error` text
//! of a failed `ToolCall`.

use std::fmt;

/// Errors from tool execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// No adapter is registered under this name.
    NotFound { name: String },
    /// Tool execution failed.
    ExecutionFailed { name: String, reason: String },
    /// The adapter did not answer within the executor's deadline.
    TimedOut { name: String },
    /// The turn was cancelled while the adapter was running.
    Cancelled { name: String },
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { name } => write!(f, "tool not found: {name}"),
            Self::ExecutionFailed { name, reason } => {
                write!(f, "tool '{name}' execution failed: {reason}")
            }
            Self::TimedOut { name } => write!(f, "tool '{name}' timed out"),
            Self::Cancelled { name } => write!(f, "tool '{name}' was cancelled"),
        }
    }
}

impl std::error::Error for ToolError {}

/// Errors from the weather lookup client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeatherError {
    /// The request could not be sent or the body could not be read.
    RequestFailed { reason: String },
    /// wttr.in answered with a non-success status.
    UnexpectedStatus { status: u16 },
    /// The document did not contain the expected fields.
    MalformedResponse { reason: String },
    /// The client could not be set up.
    InvalidConfig { reason: String },
}

impl fmt::Display for WeatherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { reason } => write!(f, "weather request failed: {reason}"),
            Self::UnexpectedStatus { status } => {
                write!(f, "weather API returned status {status}")
            }
            Self::MalformedResponse { reason } => {
                write!(f, "malformed weather response: {reason}")
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid weather client configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for WeatherError {}
