//! Voice navigation assistants
//!
//! Each activation is one recognition session:
//! `Idle -> Listening -> {Matched | Unmatched | Errored} -> Idle`.

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use crate::Error;
use crate::error::Capability;
use crate::host::{Notifier, Router, Severity};
use crate::navigation::table::{RouteOutcome, RouteTable};
use crate::session::LanguageSession;
use crate::speech::{ListenOutcome, SpeechInput};

/// Number of example commands listed after an unmatched transcript
const EXAMPLE_COMMANDS: usize = 3;

/// Which assistant an instance plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssistantKind {
    /// Persistent floating voice button
    Floating,
    /// Route-scoped navigation helper
    Navigation,
}

impl AssistantKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Floating => "floating",
            Self::Navigation => "navigation",
        }
    }

    /// Built-in phrase table for this assistant
    #[must_use]
    pub fn default_table(&self) -> RouteTable {
        match self {
            Self::Floating => RouteTable::floating_assistant(),
            Self::Navigation => RouteTable::navigation_assistant(),
        }
    }
}

/// Observable recognition session state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantState {
    Idle,
    Listening,
    /// Transcript resolved to this path
    Matched(String),
    /// Transcript matched nothing
    Unmatched(String),
    /// Recognition failed with this reason
    Errored(String),
}

impl AssistantState {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Matched(_) | Self::Unmatched(_) | Self::Errored(_))
    }
}

/// Listens for a spoken command and navigates to the matching route
pub struct VoiceAssistant {
    kind: AssistantKind,
    input: SpeechInput,
    table: RouteTable,
    router: Arc<dyn Router>,
    notifier: Arc<dyn Notifier>,
    session: LanguageSession,
    state: Mutex<AssistantState>,
    events: broadcast::Sender<AssistantState>,
}

impl VoiceAssistant {
    #[must_use]
    pub fn new(
        kind: AssistantKind,
        input: SpeechInput,
        router: Arc<dyn Router>,
        notifier: Arc<dyn Notifier>,
        session: LanguageSession,
    ) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            kind,
            input,
            table: kind.default_table(),
            router,
            notifier,
            session,
            state: Mutex::new(AssistantState::Idle),
            events,
        }
    }

    /// Replace the phrase table
    #[must_use]
    pub fn with_table(mut self, table: RouteTable) -> Self {
        self.table = table;
        self
    }

    #[must_use]
    pub const fn kind(&self) -> AssistantKind {
        self.kind
    }

    #[must_use]
    pub const fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Whether the trigger control should render at all
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.input.is_supported()
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> AssistantState {
        self.state
            .lock()
            .map(|s| s.clone())
            .unwrap_or(AssistantState::Idle)
    }

    /// Receive every state transition
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AssistantState> {
        self.events.subscribe()
    }

    /// Run one recognition session and act on it
    ///
    /// Returns the terminal state reached. While a session is active a
    /// second activation returns `Listening` without doing anything.
    pub async fn activate(&self) -> AssistantState {
        if self.input.is_listening() {
            tracing::debug!(assistant = self.kind.as_str(), "already listening");
            return AssistantState::Listening;
        }

        if !self.input.is_supported() {
            let terminal = self.fail(&Error::Unsupported(Capability::Recognition));
            self.settle(terminal.clone());
            return terminal;
        }

        self.transition(AssistantState::Listening);
        let mut activation = Activation {
            assistant: self,
            settled: false,
        };

        let terminal = match self.input.listen().await {
            Ok(ListenOutcome::Transcript(transcript)) => self.dispatch(&transcript),
            Ok(ListenOutcome::Busy) => {
                activation.settled = true;
                return AssistantState::Listening;
            }
            Ok(ListenOutcome::Cancelled) => {
                activation.settled = true;
                self.transition(AssistantState::Idle);
                return AssistantState::Idle;
            }
            Err(e) => self.fail(&e),
        };

        activation.settled = true;
        self.settle(terminal.clone());
        terminal
    }

    /// Abort the active session without navigating
    pub fn cancel(&self) {
        self.input.stop();
    }

    /// Route a transcript and navigate when it resolves to a new path
    pub fn dispatch(&self, transcript: &str) -> AssistantState {
        match self.table.route(transcript) {
            RouteOutcome::Matched(path) => {
                if self.router.current_path() == path {
                    tracing::debug!(
                        assistant = self.kind.as_str(),
                        path = %path,
                        "already on route"
                    );
                } else {
                    tracing::info!(
                        assistant = self.kind.as_str(),
                        path = %path,
                        transcript,
                        "voice navigation"
                    );
                    self.router.navigate(&path);
                }
                AssistantState::Matched(path)
            }
            RouteOutcome::Unmatched => {
                tracing::info!(assistant = self.kind.as_str(), transcript, "unmatched command");
                let message = format!(
                    "{} {}",
                    self.session.translate("voice.unmatched"),
                    self.table.example_commands(EXAMPLE_COMMANDS).join(", ")
                );
                self.notifier.notify(&message, Severity::Info);
                AssistantState::Unmatched(transcript.to_string())
            }
        }
    }

    fn fail(&self, error: &Error) -> AssistantState {
        let (message, severity) = match error {
            Error::NoSpeechDetected => {
                (self.session.translate("voice.no_speech"), Severity::Warning)
            }
            Error::Unsupported(_) => {
                (self.session.translate("voice.not_supported"), Severity::Error)
            }
            other => (
                format!("{}: {other}", self.session.translate("voice.error")),
                Severity::Error,
            ),
        };

        self.notifier.notify(&message, severity);
        AssistantState::Errored(error.to_string())
    }

    /// Publish a terminal state, then return to idle
    fn settle(&self, terminal: AssistantState) {
        debug_assert!(terminal.is_terminal());
        self.transition(terminal);
        self.transition(AssistantState::Idle);
    }

    fn transition(&self, next: AssistantState) {
        tracing::trace!(assistant = self.kind.as_str(), state = ?next, "assistant state");
        if let Ok(mut state) = self.state.lock() {
            *state = next.clone();
        }
        let _ = self.events.send(next);
    }
}

/// Returns the assistant to `Idle` when an activation is dropped mid-session
struct Activation<'a> {
    assistant: &'a VoiceAssistant,
    settled: bool,
}

impl Drop for Activation<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::debug!(assistant = self.assistant.kind.as_str(), "activation abandoned");
            self.assistant.transition(AssistantState::Idle);
        }
    }
}
