//! In-memory session store.
//!
//! Sessions live in a sharded concurrent map. Work on distinct sessions does
//! not contend on a global lock, and an append holds only its own entry's
//! write lock, so concurrent appends to one session are never lost.

use crate::error::SessionError;
use crate::message::{Message, MessageRole};
use crate::session::Session;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use skychat_core::SessionId;
use std::time::Duration;
use tracing::{debug, info};

/// Something that can evict sessions idle for longer than a maximum age.
pub trait SessionSweeper: Send + Sync {
    /// Removes every session whose last update is older than `max_age`.
    /// Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage fails.
    fn sweep(&self, max_age: Duration) -> Result<usize, SessionError>;
}

/// Concurrent map of sessions keyed by id.
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<SessionId, Session>,
    default_model: String,
}

impl SessionStore {
    /// Creates an empty store. Sessions created without an explicit model
    /// use `default_model`.
    #[must_use]
    pub fn new(default_model: impl Into<String>) -> Self {
        Self {
            sessions: DashMap::new(),
            default_model: default_model.into(),
        }
    }

    /// Returns the model used for sessions created without one.
    #[must_use]
    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Creates an empty session and returns its id.
    pub fn create(&self, model: Option<&str>) -> SessionId {
        let session = Session::new(model.unwrap_or(&self.default_model));
        let id = session.id;
        debug!(session_id = %id, model = %session.model, "created session");
        self.sessions.insert(id, session);
        id
    }

    /// Returns a snapshot of the session.
    #[must_use]
    pub fn get(&self, id: &SessionId) -> Option<Session> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    /// Appends a message to a session's transcript.
    ///
    /// Returns the transcript length after the append.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] if the session does not exist;
    /// nothing is recorded in that case.
    pub fn append(
        &self,
        id: &SessionId,
        role: MessageRole,
        content: impl Into<String>,
    ) -> skychat_core::Result<usize, SessionError> {
        let mut entry = self
            .sessions
            .get_mut(id)
            .ok_or(SessionError::NotFound { id: *id })?;
        entry.append(Message::new(role, content));
        Ok(entry.message_count())
    }

    /// Removes a session. Returns whether anything was removed.
    pub fn remove(&self, id: &SessionId) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Removes every session last updated more than `max_age` ago.
    pub fn sweep(&self, max_age: Duration) -> usize {
        let cutoff = chrono::Duration::from_std(max_age)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age));
        match cutoff {
            Some(cutoff) => self.sweep_older_than(cutoff),
            None => 0,
        }
    }

    /// Removes every session with `last_updated_at` strictly before `cutoff`.
    ///
    /// A session touched after it was selected is kept: the age check is
    /// repeated under the entry lock.
    pub fn sweep_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        let stale: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|entry| entry.last_updated_at < cutoff)
            .map(|entry| *entry.key())
            .collect();

        let removed = stale
            .into_iter()
            .filter(|id| {
                self.sessions
                    .remove_if(id, |_, session| session.last_updated_at < cutoff)
                    .is_some()
            })
            .count();

        if removed > 0 {
            info!(removed, %cutoff, "evicted stale sessions");
        }
        removed
    }

    /// Returns the number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns true if there are no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionSweeper for SessionStore {
    fn sweep(&self, max_age: Duration) -> Result<usize, SessionError> {
        Ok(SessionStore::sweep(self, max_age))
    }
}
