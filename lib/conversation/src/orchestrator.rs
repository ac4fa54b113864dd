//! Per-turn conversation protocol.
//!
//! A turn resolves (or creates) the session, runs any lookup the message
//! calls for, records the exchange, and asks the chat backend for a reply.
//! Tool output reaches the backend as context prepended to the user's
//! message for that call only; the transcript keeps the raw message plus one
//! tagged system entry per successful lookup, and those entries are never
//! replayed.
//!
//! The transcript is log-forward: a failed turn keeps the user message.

use crate::error::ConversationError;
use crate::message::{Message, MessageRole};
use crate::session::Session;
use crate::store::SessionStore;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use skychat_ai::{ChatBackend, ChatMessage, ChatReply, ChatRequest, LlmError};
use skychat_core::SessionId;
use skychat_tools::{
    IntentDetector, ToolCall, ToolExecutor, render_tool_context, tool_summary_entry,
};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

/// Orchestrator settings.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Model used when neither the request nor the session names one.
    pub default_model: String,
    /// Deadline for one backend call.
    pub request_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            default_model: "llama3.2:latest".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// One inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRequest {
    /// The user's message.
    pub message: String,
    /// Model override for this turn.
    pub model: Option<String>,
    /// Session to continue. A new session is created when absent.
    pub session_id: Option<SessionId>,
}

impl TurnRequest {
    /// Creates a request that starts a new session.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            model: None,
            session_id: None,
        }
    }

    /// Continues an existing session.
    #[must_use]
    pub fn in_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Overrides the model for this turn.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Result of a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// Assistant reply; empty on failure.
    pub response: String,
    /// Model that answered, or the model that was asked.
    pub model: String,
    /// Whether the backend produced a reply.
    pub success: bool,
    /// Session the turn ran in. Absent only if no session could be resolved.
    pub session_id: Option<SessionId>,
    /// User and assistant entries in the transcript after the turn.
    pub message_count: usize,
    /// Lookups performed for this turn.
    pub tool_calls: Vec<ToolCall>,
    /// When the outcome was produced.
    pub created_at: DateTime<Utc>,
}

impl TurnOutcome {
    fn failed(
        model: impl Into<String>,
        session_id: Option<SessionId>,
        message_count: usize,
        tool_calls: Vec<ToolCall>,
    ) -> Self {
        Self {
            response: String::new(),
            model: model.into(),
            success: false,
            session_id,
            message_count,
            tool_calls,
            created_at: Utc::now(),
        }
    }
}

/// Snapshot of a session for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionHistory {
    /// Session identifier.
    pub session_id: SessionId,
    /// Model the session was created for.
    pub model: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the transcript last changed.
    pub last_updated_at: DateTime<Utc>,
    /// Number of entries in `messages`.
    pub message_count: usize,
    /// Full transcript, tool entries included.
    pub messages: Vec<Message>,
}

impl From<Session> for SessionHistory {
    fn from(session: Session) -> Self {
        Self {
            session_id: session.id,
            message_count: session.message_count(),
            model: session.model,
            created_at: session.created_at,
            last_updated_at: session.last_updated_at,
            messages: session.messages,
        }
    }
}

/// Runs conversation turns against a session store, a tool executor, and a
/// chat backend.
pub struct ConversationOrchestrator {
    store: Arc<SessionStore>,
    detector: Arc<dyn IntentDetector>,
    executor: ToolExecutor,
    backend: Arc<dyn ChatBackend>,
    config: OrchestratorConfig,
}

impl ConversationOrchestrator {
    /// Creates an orchestrator.
    #[must_use]
    pub fn new(
        store: Arc<SessionStore>,
        detector: Arc<dyn IntentDetector>,
        executor: ToolExecutor,
        backend: Arc<dyn ChatBackend>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            detector,
            executor,
            backend,
            config,
        }
    }

    /// Returns the session store.
    #[must_use]
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Starts an empty session.
    pub fn create_session(&self, model: Option<&str>) -> SessionId {
        let id = self.store.create(model);
        info!(session_id = %id, "session started");
        id
    }

    /// Returns the transcript of a session, if it exists.
    #[must_use]
    pub fn history(&self, session_id: &SessionId) -> Option<SessionHistory> {
        self.store.get(session_id).map(SessionHistory::from)
    }

    /// Deletes a session. Deleting an unknown session is not an error.
    pub fn delete_session(&self, session_id: &SessionId) {
        if self.store.remove(session_id) {
            info!(session_id = %session_id, "session deleted");
        }
    }

    /// Runs one turn.
    ///
    /// Never fails: backend trouble, an unknown session, or a fault inside
    /// the turn all come back as an outcome with `success == false`. Detail
    /// about unexpected faults is logged, not returned.
    pub async fn submit_turn(
        &self,
        request: TurnRequest,
        cancel: &CancellationToken,
    ) -> TurnOutcome {
        let (session_id, session_model) = match self.resolve_session(&request) {
            Ok(resolved) => resolved,
            Err(report) => {
                error!(error = %report, "could not resolve session");
                return TurnOutcome::failed(self.fallback_model(&request), None, 0, Vec::new());
            }
        };

        let turn = self.run_turn(&request, session_id, &session_model, cancel);
        let report = match AssertUnwindSafe(turn).catch_unwind().await {
            Ok(Ok(outcome)) => return outcome,
            Ok(Err(report)) => report,
            Err(panic) => Report::from(ConversationError::TurnPanicked {
                reason: panic_message(panic.as_ref()),
            }),
        };

        error!(session_id = %session_id, error = %report, "turn failed unexpectedly");
        TurnOutcome::failed(
            self.fallback_model(&request),
            Some(session_id),
            0,
            Vec::new(),
        )
    }

    fn fallback_model(&self, request: &TurnRequest) -> String {
        request
            .model
            .clone()
            .unwrap_or_else(|| self.config.default_model.clone())
    }

    fn resolve_session(
        &self,
        request: &TurnRequest,
    ) -> Result<(SessionId, String), Report<ConversationError>> {
        match request.session_id {
            Some(id) => {
                let session = self
                    .store
                    .get(&id)
                    .ok_or_else(|| ConversationError::SessionOperation {
                        session_id: id,
                        reason: "session not found".to_string(),
                    })?;
                Ok((id, session.model))
            }
            None => {
                let id = self.store.create(request.model.as_deref());
                let model = request
                    .model
                    .clone()
                    .unwrap_or_else(|| self.store.default_model().to_string());
                Ok((id, model))
            }
        }
    }

    #[instrument(skip_all, fields(session_id = %session_id))]
    async fn run_turn(
        &self,
        request: &TurnRequest,
        session_id: SessionId,
        session_model: &str,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, Report<ConversationError>> {
        let intents: Vec<_> = self.detector.detect(&request.message).into_iter().collect();
        let tool_calls = self.executor.execute_all(&intents, cancel).await;

        let user_index = self.record(session_id, MessageRole::User, &request.message)? - 1;

        let successful: Vec<ToolCall> = tool_calls.iter().filter(|c| c.success).cloned().collect();
        let augmented = if successful.is_empty() {
            None
        } else {
            let registry = self.executor.registry();
            for call in &successful {
                self.record(
                    session_id,
                    MessageRole::System,
                    tool_summary_entry(registry, call),
                )?;
            }
            let context = render_tool_context(registry, &successful);
            let content = format!(
                "[SYSTEM CONTEXT]\n{context}\n[USER MESSAGE]\n{}",
                request.message
            );
            Some((user_index, content))
        };

        let session = self
            .store
            .get(&session_id)
            .ok_or_else(|| ConversationError::SessionOperation {
                session_id,
                reason: "session disappeared during the turn".to_string(),
            })?;
        let messages = outbound_messages(&session, augmented);
        let conversation_len = session.conversation_len();

        let model = request
            .model
            .clone()
            .unwrap_or_else(|| session_model.to_string());
        let chat_request = ChatRequest::new(model.clone(), messages);

        let reply = match self.call_backend(&chat_request, cancel).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(
                    model = %model,
                    interrupted = e.is_interrupted(),
                    error = %e,
                    "chat backend call failed"
                );
                return Ok(TurnOutcome::failed(
                    model,
                    Some(session_id),
                    conversation_len,
                    tool_calls,
                ));
            }
        };

        self.record(session_id, MessageRole::Assistant, reply.content())?;

        let model = if reply.model.is_empty() {
            model
        } else {
            reply.model.clone()
        };
        info!(model = %model, tools = tool_calls.len(), "turn completed");

        Ok(TurnOutcome {
            response: reply.content().to_string(),
            model,
            success: true,
            session_id: Some(session_id),
            message_count: conversation_len + 1,
            tool_calls,
            created_at: Utc::now(),
        })
    }

    async fn call_backend(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> Result<ChatReply, LlmError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(LlmError::Cancelled),
            reply = tokio::time::timeout(self.config.request_timeout, self.backend.chat(request)) => {
                reply.map_err(|_elapsed| LlmError::Timeout)?
            }
        }
    }

    fn record(
        &self,
        session_id: SessionId,
        role: MessageRole,
        content: impl Into<String>,
    ) -> Result<usize, Report<ConversationError>> {
        self.store.append(&session_id, role, content).map_err(|report| {
            ConversationError::SessionOperation {
                session_id,
                reason: report.to_string(),
            }
            .into()
        })
    }
}

/// Builds the backend message list from a transcript.
///
/// Tool-summary entries are dropped. `augmented` pairs a transcript index
/// with replacement content: the turn's own user entry is sent with that
/// content, in the outbound copy only. Entries appended by other turns on the
/// same session go out as recorded, even when they come later.
fn outbound_messages(
    session: &Session,
    mut augmented: Option<(usize, String)>,
) -> Vec<ChatMessage> {
    session
        .messages
        .iter()
        .enumerate()
        .filter(|(_, m)| !m.is_tool_summary())
        .map(|(index, m)| {
            let mut message = ChatMessage::from(m);
            if augmented.as_ref().is_some_and(|(target, _)| *target == index)
                && let Some((_, content)) = augmented.take()
            {
                message.content = content;
            }
            message
        })
        .collect()
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
