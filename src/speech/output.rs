//! Text-to-speech in the active language
//!
//! At most one utterance is audible at a time. Starting a new one cancels
//! the previous, whose `speak` call resolves with [`Error::Interrupted`].

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::error::Capability;
use crate::host::{Notifier, Severity};
use crate::i18n::Language;
use crate::session::LanguageSession;
use crate::speech::voice::{FALLBACK_SPEECH_CODE, Utterance, Voice, VoiceChoice, choose_voice};
use crate::{Error, Result};

/// Engine that turns utterances into audio
#[async_trait]
pub trait SynthesisBackend: Send + Sync {
    /// Whether the runtime has a synthesis capability at all
    fn is_available(&self) -> bool;

    /// Voices currently installed
    async fn voices(&self) -> Result<Vec<Voice>>;

    /// Play `utterance`, returning once playback ends
    async fn speak(&self, utterance: &Utterance) -> Result<()>;

    /// Stop whatever is playing; must be safe to call when idle
    fn cancel(&self);
}

/// Rate, pitch and volume applied to every utterance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prosody {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for Prosody {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

struct Playback {
    id: u64,
    cancel: oneshot::Sender<()>,
}

/// Speaks text in the session's active language
pub struct SpeechOutput {
    backend: Arc<dyn SynthesisBackend>,
    session: LanguageSession,
    notifier: Arc<dyn Notifier>,
    prosody: Prosody,
    advised: Mutex<HashSet<&'static str>>,
    active: Mutex<Option<Playback>>,
    next_id: AtomicU64,
}

impl SpeechOutput {
    #[must_use]
    pub fn new(
        backend: Arc<dyn SynthesisBackend>,
        session: LanguageSession,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            backend,
            session,
            notifier,
            prosody: Prosody::default(),
            advised: Mutex::new(HashSet::new()),
            active: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Override the default prosody
    #[must_use]
    pub const fn with_prosody(mut self, prosody: Prosody) -> Self {
        self.prosody = prosody;
        self
    }

    /// Speak `text` in the active language
    ///
    /// Falls back to an English voice when the language has none installed,
    /// advising the user once per language.
    ///
    /// # Errors
    ///
    /// - [`Error::Unsupported`] when synthesis is unavailable (checked first)
    /// - [`Error::Interrupted`] when cancelled or superseded by a newer call
    /// - [`Error::Synthesis`] when playback fails
    pub async fn speak(&self, text: &str) -> Result<()> {
        if !self.backend.is_available() {
            return Err(Error::Unsupported(Capability::Synthesis));
        }

        let (mut playback, cancelled) = self.begin();
        let id = playback.id;
        let language = self.session.current();

        let work = async {
            let utterance = self.prepare(text, language).await;
            tracing::debug!(
                utterance = %utterance.id,
                lang = %utterance.lang,
                voice = utterance.voice.as_ref().map(|v| v.id.as_str()),
                "speaking"
            );
            self.backend.speak(&utterance).await
        };

        let result = tokio::select! {
            biased;
            _ = cancelled => Err(Error::Interrupted),
            result = work => result,
        };

        playback.settled = true;
        drop(playback);

        if let Err(e) = &result {
            if e.is_benign() {
                tracing::debug!(playback = id, "utterance interrupted");
            } else {
                tracing::warn!(playback = id, error = %e, "utterance failed");
            }
        }
        result
    }

    /// Stop the current utterance, if any
    pub fn cancel(&self) {
        let previous = self.active.lock().ok().and_then(|mut a| a.take());
        if let Some(playback) = previous {
            let _ = playback.cancel.send(());
            self.backend.cancel();
            tracing::debug!(playback = playback.id, "speech cancelled");
        }
    }

    /// Whether an utterance is in flight
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.active.lock().map(|a| a.is_some()).unwrap_or(false)
    }

    /// Voices the backend has installed
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] when synthesis is unavailable, or the
    /// backend's error if listing fails
    pub async fn voices(&self) -> Result<Vec<Voice>> {
        if !self.backend.is_available() {
            return Err(Error::Unsupported(Capability::Synthesis));
        }
        self.backend.voices().await
    }

    async fn prepare(&self, text: &str, language: Language) -> Utterance {
        let mut utterance = Utterance::new(text, language.speech_code);
        utterance.rate = self.prosody.rate;
        utterance.pitch = self.prosody.pitch;
        utterance.volume = self.prosody.volume;

        let voices = self.backend.voices().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to list voices");
            Vec::new()
        });

        match choose_voice(&voices, &language) {
            VoiceChoice::Native(voice) => utterance.voice = Some(voice),
            VoiceChoice::EnglishFallback { voice, advise } => {
                tracing::debug!(
                    language = language.code,
                    voices = voices.len(),
                    "no voice for language, using English"
                );
                if advise {
                    self.advise_once(language);
                }
                utterance.voice = voice;
                utterance.lang = FALLBACK_SPEECH_CODE.to_string();
            }
        }

        utterance
    }

    fn advise_once(&self, language: Language) {
        let first = self
            .advised
            .lock()
            .map(|mut advised| advised.insert(language.code))
            .unwrap_or(false);

        if first {
            let message = self
                .session
                .message_for(language, "speech.unsupported_language");
            self.notifier.notify(&message, Severity::Warning);
        }
    }

    fn begin(&self) -> (PlaybackGuard<'_>, oneshot::Receiver<()>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();

        let previous = self
            .active
            .lock()
            .ok()
            .and_then(|mut active| active.replace(Playback { id, cancel: tx }));

        if let Some(previous) = previous {
            let _ = previous.cancel.send(());
            self.backend.cancel();
            tracing::debug!(
                superseded = previous.id,
                playback = id,
                "superseding utterance"
            );
        }

        (
            PlaybackGuard {
                output: self,
                id,
                settled: false,
            },
            rx,
        )
    }

    /// Clear the slot if it still belongs to `id`
    fn finish(&self, id: u64) -> bool {
        let Ok(mut active) = self.active.lock() else {
            return false;
        };
        if active.as_ref().is_some_and(|p| p.id == id) {
            *active = None;
            true
        } else {
            false
        }
    }
}

/// Clears the playback slot however `speak` ends, including when its
/// future is dropped mid-utterance
struct PlaybackGuard<'a> {
    output: &'a SpeechOutput,
    id: u64,
    settled: bool,
}

impl Drop for PlaybackGuard<'_> {
    fn drop(&mut self) {
        if self.output.finish(self.id) && !self.settled {
            self.output.backend.cancel();
            tracing::debug!(playback = self.id, "utterance abandoned");
        }
    }
}
