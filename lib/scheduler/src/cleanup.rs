//! Periodic eviction of idle sessions.
//!
//! The scheduler sweeps once on start, then once per interval. A sweep that
//! fails or panics is logged and retried after a fixed backoff; it never
//! stops the loop. Cancellation is observed during every wait, and once observed the
//! loop exits without touching the store again.

use crate::error::SchedulerError;
use serde::Deserialize;
use skychat_conversation::SessionSweeper;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Wait before retrying after a failed sweep.
const ERROR_BACKOFF: Duration = Duration::from_secs(5 * 60);

/// Cleanup settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CleanupConfig {
    /// Minutes between sweeps.
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,

    /// Sessions idle for longer than this many hours are evicted.
    #[serde(default = "default_max_session_age_hours")]
    pub max_session_age_hours: u64,
}

fn default_interval_minutes() -> u64 {
    30
}

fn default_max_session_age_hours() -> u64 {
    24
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            max_session_age_hours: default_max_session_age_hours(),
        }
    }
}

impl CleanupConfig {
    /// Returns the time between sweeps.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }

    /// Returns the idle age past which sessions are evicted.
    #[must_use]
    pub fn max_session_age(&self) -> Duration {
        Duration::from_secs(self.max_session_age_hours.saturating_mul(60 * 60))
    }

    /// Checks that the settings describe a usable schedule.
    ///
    /// # Errors
    ///
    /// Returns an error if the interval is zero.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.interval_minutes == 0 {
            return Err(SchedulerError::InvalidConfig {
                reason: "cleanup interval must be at least one minute".to_string(),
            });
        }
        Ok(())
    }
}

/// Background task that evicts idle sessions.
pub struct CleanupScheduler<S> {
    sweeper: Arc<S>,
    interval: Duration,
    max_age: Duration,
    error_backoff: Duration,
}

impl<S> CleanupScheduler<S>
where
    S: SessionSweeper + 'static,
{
    /// Creates a scheduler over a sweeper.
    #[must_use]
    pub fn new(sweeper: Arc<S>, config: &CleanupConfig) -> Self {
        Self {
            sweeper,
            interval: config.interval(),
            max_age: config.max_session_age(),
            error_backoff: ERROR_BACKOFF,
        }
    }

    /// Runs the sweep loop until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            interval = ?self.interval,
            max_age = ?self.max_age,
            "session cleanup started"
        );

        while !cancel.is_cancelled() {
            let swept =
                panic::catch_unwind(AssertUnwindSafe(|| self.sweeper.sweep(self.max_age)));
            let wait = match swept {
                Ok(Ok(0)) => {
                    debug!("no stale sessions");
                    self.interval
                }
                Ok(Ok(removed)) => {
                    info!(removed, "swept stale sessions");
                    self.interval
                }
                Ok(Err(e)) => {
                    error!(error = %e, backoff = ?self.error_backoff, "session sweep failed");
                    self.error_backoff
                }
                Err(panic) => {
                    error!(
                        panic = %panic_message(panic.as_ref()),
                        backoff = ?self.error_backoff,
                        "session sweep panicked"
                    );
                    self.error_backoff
                }
            };

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(wait) => {}
            }
        }

        info!("session cleanup stopped");
    }

    /// Runs the sweep loop on its own task.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
