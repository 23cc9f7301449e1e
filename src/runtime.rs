//! Wires the language session, speech engines and assistants together

use std::sync::Arc;

use crate::config::Config;
use crate::db::{self, SqliteStore};
use crate::host::{LocaleSink, MemoryRouter, Notifier, Router, TracingLocaleSink, TracingNotifier};
use crate::navigation::{AssistantKind, VoiceAssistant};
use crate::session::LanguageSession;
use crate::speech::{
    EspeakBackend, RecognitionBackend, SpeechInput, SpeechOutput, SynthesisBackend,
    WhisperRecognizer,
};
use crate::store::PreferenceStore;
use crate::Result;

/// Collaborators a [`Runtime`] is built from
pub struct Collaborators {
    pub store: Arc<dyn PreferenceStore>,
    pub synthesis: Arc<dyn SynthesisBackend>,
    pub recognition: Arc<dyn RecognitionBackend>,
    pub router: Arc<dyn Router>,
    pub notifier: Arc<dyn Notifier>,
    pub locale_sink: Arc<dyn LocaleSink>,
}

/// The speech core of one application instance
pub struct Runtime {
    config: Config,
    session: LanguageSession,
    output: Arc<SpeechOutput>,
    recognition: Arc<dyn RecognitionBackend>,
    router: Arc<dyn Router>,
    notifier: Arc<dyn Notifier>,
}

impl Runtime {
    /// Build from explicit collaborators
    ///
    /// Probes the synthesis backend once for the speech capability flag.
    #[must_use]
    pub fn new(config: Config, parts: Collaborators) -> Self {
        let speech_supported = parts.synthesis.is_available();

        let session = LanguageSession::builder(parts.store)
            .locale_sink(parts.locale_sink)
            .notifier(Arc::clone(&parts.notifier))
            .runtime_locale(config.runtime_locale())
            .speech_supported(speech_supported)
            .initialize();

        let output =
            SpeechOutput::new(parts.synthesis, session.clone(), Arc::clone(&parts.notifier))
                .with_prosody(config.speech.prosody);

        Self {
            config,
            session,
            output: Arc::new(output),
            recognition: parts.recognition,
            router: parts.router,
            notifier: parts.notifier,
        }
    }

    /// Build with the local backends: `SQLite` preferences, espeak-ng and Whisper
    ///
    /// # Errors
    ///
    /// Returns error if the preferences database cannot be opened
    pub fn from_config(config: Config) -> Result<Self> {
        let pool = db::init(config.database_path())?;
        let recognizer = WhisperRecognizer::new(
            config.recognition.api_key.clone(),
            &config.recognition.model,
        )
        .with_url(&config.recognition.url)
        .with_endpoint(config.recognition.endpoint());

        let parts = Collaborators {
            store: Arc::new(SqliteStore::new(pool)),
            synthesis: Arc::new(EspeakBackend::new(&config.speech.espeak_program)),
            recognition: Arc::new(recognizer),
            router: Arc::new(MemoryRouter::default()),
            notifier: Arc::new(TracingNotifier),
            locale_sink: Arc::new(TracingLocaleSink),
        };

        Ok(Self::new(config, parts))
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub const fn session(&self) -> &LanguageSession {
        &self.session
    }

    #[must_use]
    pub fn output(&self) -> Arc<SpeechOutput> {
        Arc::clone(&self.output)
    }

    #[must_use]
    pub fn router(&self) -> Arc<dyn Router> {
        Arc::clone(&self.router)
    }

    /// Recognizer in the active language's speech code
    #[must_use]
    pub fn speech_input(&self) -> SpeechInput {
        SpeechInput::new(
            Arc::clone(&self.recognition),
            self.session.current().speech_code,
        )
    }

    /// One of the two voice navigation assistants, listening in `en-US`
    #[must_use]
    pub fn assistant(&self, kind: AssistantKind) -> VoiceAssistant {
        VoiceAssistant::new(
            kind,
            SpeechInput::for_assistant(Arc::clone(&self.recognition)),
            Arc::clone(&self.router),
            Arc::clone(&self.notifier),
            self.session.clone(),
        )
        .with_table(self.config.assistants.table(kind))
    }
}
