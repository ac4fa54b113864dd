//! Line-oriented chat driver.
//!
//! Each input line is either a slash command or a message for the current
//! session. The driver holds no conversation state of its own beyond the id
//! of the session it is talking in.

use skychat_conversation::{ConversationOrchestrator, MessageRole, TurnOutcome, TurnRequest};
use skychat_core::SessionId;
use std::fmt::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Help text for `/help`.
pub const HELP: &str = "\
Commands:
  /new [model]  start a new session, optionally with a specific model
  /history      show the current session's transcript
  /clear        delete the current session
  /help         show this help
  /quit         exit
Anything else is sent to the assistant.";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A message for the assistant.
    Say(String),
    /// Start a new session.
    New { model: Option<String> },
    /// Show the current transcript.
    History,
    /// Delete the current session.
    Clear,
    /// Show help.
    Help,
    /// Exit.
    Quit,
    /// Blank line.
    Empty,
    /// Unrecognized slash command.
    Unknown(String),
}

impl Command {
    /// Parses one input line.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        let Some(command) = line.strip_prefix('/') else {
            return Self::Say(line.to_string());
        };

        let mut words = command.split_whitespace();
        match words.next().unwrap_or_default() {
            "new" => Self::New {
                model: words.next().map(str::to_string),
            },
            "history" => Self::History,
            "clear" => Self::Clear,
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// What the driver should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Print this text.
    Print(String),
    /// Nothing to show.
    Nothing,
    /// Stop reading input.
    Quit,
}

/// Chat driver over an orchestrator.
pub struct Repl {
    orchestrator: Arc<ConversationOrchestrator>,
    session: Option<SessionId>,
}

impl Repl {
    /// Creates a driver with no current session.
    #[must_use]
    pub fn new(orchestrator: Arc<ConversationOrchestrator>) -> Self {
        Self {
            orchestrator,
            session: None,
        }
    }

    /// Returns the session messages are currently sent to.
    #[must_use]
    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    /// Executes one command.
    pub async fn handle(&mut self, command: Command, cancel: &CancellationToken) -> Step {
        match command {
            Command::Say(message) => self.say(message, cancel).await,
            Command::New { model } => {
                let id = self.orchestrator.create_session(model.as_deref());
                self.session = Some(id);
                Step::Print(format!("started session {id}"))
            }
            Command::History => self.history(),
            Command::Clear => match self.session.take() {
                Some(id) => {
                    self.orchestrator.delete_session(&id);
                    Step::Print(format!("deleted session {id}"))
                }
                None => Step::Print("no current session".to_string()),
            },
            Command::Help => Step::Print(HELP.to_string()),
            Command::Quit => Step::Quit,
            Command::Empty => Step::Nothing,
            Command::Unknown(name) => {
                Step::Print(format!("unknown command /{name}; try /help"))
            }
        }
    }

    async fn say(&mut self, message: String, cancel: &CancellationToken) -> Step {
        let mut request = TurnRequest::new(message);
        if let Some(id) = self.session {
            request = request.in_session(id);
        }

        let outcome = self.orchestrator.submit_turn(request, cancel).await;
        if outcome.session_id.is_some() {
            self.session = outcome.session_id;
        } else {
            // The session is gone (evicted or deleted); the next message starts over.
            self.session = None;
        }
        Step::Print(render_outcome(&outcome))
    }

    fn history(&self) -> Step {
        let Some(history) = self.session.and_then(|id| self.orchestrator.history(&id)) else {
            return Step::Print("no current session".to_string());
        };

        let mut out = format!(
            "session {} ({}, {} messages)\n",
            history.session_id, history.model, history.message_count
        );
        for message in &history.messages {
            let role = match message.role {
                _ if message.is_tool_summary() => "tool",
                MessageRole::User => "you",
                MessageRole::Assistant => "assistant",
                MessageRole::System => "system",
            };
            let _ = writeln!(
                out,
                "[{}] {role}: {}",
                message.created_at.format("%H:%M:%S"),
                message.content.trim_end()
            );
        }
        Step::Print(out.trim_end().to_string())
    }
}

fn render_outcome(outcome: &TurnOutcome) -> String {
    let mut out = String::new();
    for call in &outcome.tool_calls {
        match &call.error {
            None => {
                let _ = writeln!(out, "({} lookup: {})", call.tool_name, call.query);
            }
            Some(error) => {
                let _ = writeln!(out, "({} lookup failed: {error})", call.tool_name);
            }
        }
    }
    if outcome.success {
        out.push_str(&outcome.response);
    } else {
        out.push_str("error: the assistant could not answer; please try again");
    }
    out
}
