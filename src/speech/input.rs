//! Single-shot speech recognition
//!
//! One session at a time per [`SpeechInput`]. A session ends after one
//! result or one error; a second `listen` while one is active is a no-op.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::Capability;
use crate::{Error, Result};

/// Language the voice assistants always listen in
pub const ASSISTANT_LANGUAGE: &str = "en-US";

/// Why a recognition attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionFailure {
    /// Session ended without any speech
    NoSpeech,
    /// Microphone permission denied
    NotAllowed,
    /// Recognition service unreachable
    Network,
    /// Session aborted by the engine
    Aborted,
    /// Anything else, verbatim from the engine
    Other(String),
}

impl fmt::Display for RecognitionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSpeech => f.write_str("no-speech"),
            Self::NotAllowed => f.write_str("not-allowed"),
            Self::Network => f.write_str("network"),
            Self::Aborted => f.write_str("aborted"),
            Self::Other(reason) => f.write_str(reason),
        }
    }
}

/// One recognition hypothesis
#[derive(Debug, Clone, PartialEq)]
pub struct Alternative {
    pub transcript: String,
    pub confidence: f32,
}

impl Alternative {
    #[must_use]
    pub fn new(transcript: &str, confidence: f32) -> Self {
        Self {
            transcript: transcript.to_string(),
            confidence,
        }
    }
}

/// Engine that turns one utterance of microphone audio into text
#[async_trait]
pub trait RecognitionBackend: Send + Sync {
    /// Whether the runtime has a recognition capability at all
    fn is_available(&self) -> bool;

    /// Capture and recognize a single utterance in `lang`
    ///
    /// Alternatives are ordered best first.
    async fn recognize(
        &self,
        lang: &str,
    ) -> std::result::Result<Vec<Alternative>, RecognitionFailure>;

    /// Abort the in-flight recognition, if any
    fn abort(&self);
}

/// Result of a `listen` call that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenOutcome {
    /// Best transcript of the utterance
    Transcript(String),
    /// Another session was already active; nothing was started
    Busy,
    /// Session was stopped before a result arrived
    Cancelled,
}

struct ActiveSession {
    id: u64,
    abort: oneshot::Sender<()>,
}

struct Inner {
    backend: Arc<dyn RecognitionBackend>,
    language: String,
    active: Mutex<Option<ActiveSession>>,
    next_id: AtomicU64,
}

impl Inner {
    /// Clear the slot if it still belongs to `id`
    fn release(&self, id: u64) -> bool {
        let Ok(mut active) = self.active.lock() else {
            return false;
        };
        if active.as_ref().is_some_and(|s| s.id == id) {
            *active = None;
            true
        } else {
            false
        }
    }

    fn take(&self, id: Option<u64>) -> Option<ActiveSession> {
        let mut active = self.active.lock().ok()?;
        match id {
            Some(id) if active.as_ref().is_some_and(|s| s.id != id) => None,
            _ => active.take(),
        }
    }
}

/// Releases the session slot however the session ends
struct SessionGuard {
    inner: Arc<Inner>,
    id: u64,
    settled: bool,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.inner.release(self.id) && !self.settled {
            self.inner.backend.abort();
            tracing::debug!(session = self.id, "recognition session abandoned");
        }
    }
}

/// Speech-to-text front end
#[derive(Clone)]
pub struct SpeechInput {
    inner: Arc<Inner>,
}

impl SpeechInput {
    /// Recognizer listening in `language` (BCP-47)
    #[must_use]
    pub fn new(backend: Arc<dyn RecognitionBackend>, language: &str) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                language: language.to_string(),
                active: Mutex::new(None),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Recognizer fixed to the assistants' language
    #[must_use]
    pub fn for_assistant(backend: Arc<dyn RecognitionBackend>) -> Self {
        Self::new(backend, ASSISTANT_LANGUAGE)
    }

    /// Language tag this recognizer listens in
    #[must_use]
    pub fn language(&self) -> &str {
        &self.inner.language
    }

    /// Whether the backend reports a recognition capability
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.inner.backend.is_available()
    }

    /// Whether a session is active
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.inner
            .active
            .lock()
            .map(|a| a.is_some())
            .unwrap_or(false)
    }

    /// Listen for one utterance
    ///
    /// # Errors
    ///
    /// - [`Error::Unsupported`] when recognition is unavailable; no session starts
    /// - [`Error::NoSpeechDetected`] when the session heard nothing
    /// - [`Error::Recognition`] for any other engine failure
    pub async fn listen(&self) -> Result<ListenOutcome> {
        if !self.is_supported() {
            return Err(Error::Unsupported(Capability::Recognition));
        }

        let Some((guard, aborted)) = self.try_begin() else {
            tracing::debug!("recognition already active, ignoring listen");
            return Ok(ListenOutcome::Busy);
        };

        self.run(guard, aborted).await
    }

    /// Callback form of [`listen`](Self::listen)
    ///
    /// Returns `None` without invoking anything when a session is already
    /// active. When recognition is unsupported `on_error` fires immediately
    /// and `None` is returned. Dropping the returned guard aborts the session
    /// and no callback fires afterward.
    pub fn start<T, E>(&self, on_transcript: T, on_error: E) -> Option<ListenGuard>
    where
        T: FnOnce(String) + Send + 'static,
        E: FnOnce(Error) + Send + 'static,
    {
        if !self.is_supported() {
            on_error(Error::Unsupported(Capability::Recognition));
            return None;
        }

        let (guard, aborted) = self.try_begin()?;
        let id = guard.id;
        let input = self.clone();

        let task = tokio::spawn(async move {
            match input.run(guard, aborted).await {
                Ok(ListenOutcome::Transcript(text)) => on_transcript(text),
                Ok(ListenOutcome::Busy | ListenOutcome::Cancelled) => {}
                Err(e) => on_error(e),
            }
        });

        Some(ListenGuard {
            input: self.clone(),
            id,
            task,
        })
    }

    /// Abort the active session; its `listen` resolves `Cancelled`
    pub fn stop(&self) {
        if let Some(session) = self.inner.take(None) {
            let _ = session.abort.send(());
            self.inner.backend.abort();
            tracing::debug!(session = session.id, "recognition stopped");
        }
    }

    fn stop_session(&self, id: u64) {
        if let Some(session) = self.inner.take(Some(id)) {
            let _ = session.abort.send(());
            self.inner.backend.abort();
            tracing::debug!(session = session.id, "recognition stopped by owner");
        }
    }

    fn try_begin(&self) -> Option<(SessionGuard, oneshot::Receiver<()>)> {
        let mut active = self.inner.active.lock().ok()?;
        if active.is_some() {
            return None;
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        *active = Some(ActiveSession { id, abort: tx });
        drop(active);

        tracing::debug!(session = id, lang = %self.inner.language, "recognition started");
        Some((
            SessionGuard {
                inner: Arc::clone(&self.inner),
                id,
                settled: false,
            },
            rx,
        ))
    }

    async fn run(
        &self,
        mut guard: SessionGuard,
        aborted: oneshot::Receiver<()>,
    ) -> Result<ListenOutcome> {
        let recognized = tokio::select! {
            biased;
            _ = aborted => None,
            result = self.inner.backend.recognize(&self.inner.language) => Some(result),
        };

        guard.settled = true;
        let id = guard.id;
        drop(guard);

        let Some(recognized) = recognized else {
            return Ok(ListenOutcome::Cancelled);
        };

        match recognized {
            Ok(alternatives) => {
                // most confident alternative; ties keep engine order
                let best = alternatives
                    .into_iter()
                    .reduce(|best, a| if a.confidence > best.confidence { a } else { best })
                    .map(|a| (a.transcript.trim().to_string(), a.confidence))
                    .filter(|(t, _)| !t.is_empty());

                match best {
                    Some((transcript, confidence)) => {
                        tracing::info!(
                            session = id,
                            transcript = %transcript,
                            confidence,
                            "recognized"
                        );
                        Ok(ListenOutcome::Transcript(transcript))
                    }
                    None => {
                        tracing::debug!(session = id, "empty recognition result");
                        Err(Error::NoSpeechDetected)
                    }
                }
            }
            Err(RecognitionFailure::NoSpeech) => {
                tracing::debug!(session = id, "no speech detected");
                Err(Error::NoSpeechDetected)
            }
            Err(failure) => {
                tracing::warn!(session = id, reason = %failure, "recognition failed");
                Err(Error::Recognition(failure.to_string()))
            }
        }
    }
}

/// Owner handle for a session started with [`SpeechInput::start`]
pub struct ListenGuard {
    input: SpeechInput,
    id: u64,
    task: JoinHandle<()>,
}

impl ListenGuard {
    /// Whether the session reached a terminal state
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ListenGuard {
    fn drop(&mut self) {
        if !self.task.is_finished() {
            self.task.abort();
            self.input.stop_session(self.id);
        }
    }
}
