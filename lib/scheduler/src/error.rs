//! Error types for the scheduler crate.

use std::fmt;

/// Errors from scheduler setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// Invalid scheduler configuration.
    InvalidConfig { reason: String },
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { reason } => {
                write!(f, "invalid scheduler config: {reason}")
            }
        }
    }
}

impl std::error::Error for SchedulerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_display() {
        let err = SchedulerError::InvalidConfig {
            reason: "interval must be positive".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid scheduler config: interval must be positive"
        );
    }
}
