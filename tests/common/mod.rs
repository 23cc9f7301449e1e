//! Shared test utilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use carevoice::host::{LocaleSink, Notifier, Severity};
use carevoice::speech::{Alternative, RecognitionFailure};
use carevoice::store::LANGUAGE_KEY;
use carevoice::{
    LanguageSession, MemoryStore, PreferenceStore, RecognitionBackend, SynthesisBackend,
    Utterance, Voice,
};

/// Gate that parks fake engines until opened
#[derive(Clone)]
pub struct Gate(Arc<watch::Sender<bool>>);

impl Gate {
    pub fn open() -> Self {
        Self(Arc::new(watch::Sender::new(true)))
    }

    pub fn closed() -> Self {
        Self(Arc::new(watch::Sender::new(false)))
    }

    pub fn release(&self) {
        self.0.send_replace(true);
    }

    async fn pass(&self) {
        let mut rx = self.0.subscribe();
        let _ = rx.wait_for(|open| *open).await;
    }
}

/// Synthesis engine that records utterances
pub struct FakeSynth {
    available: bool,
    voices: Vec<Voice>,
    gate: Gate,
    failure: Option<String>,
    spoken: Mutex<Vec<Utterance>>,
    cancels: AtomicUsize,
}

impl FakeSynth {
    pub fn new(voices: Vec<Voice>) -> Self {
        Self {
            available: true,
            voices,
            gate: Gate::open(),
            failure: None,
            spoken: Mutex::new(Vec::new()),
            cancels: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(Vec::new())
        }
    }

    /// Hold every utterance until `gate` opens
    pub fn gated(mut self, gate: Gate) -> Self {
        self.gate = gate;
        self
    }

    /// Fail every utterance once it starts playing
    pub fn failing(mut self, reason: &str) -> Self {
        self.failure = Some(reason.to_string());
        self
    }

    pub fn spoken(&self) -> Vec<Utterance> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SynthesisBackend for FakeSynth {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn voices(&self) -> carevoice::Result<Vec<Voice>> {
        Ok(self.voices.clone())
    }

    async fn speak(&self, utterance: &Utterance) -> carevoice::Result<()> {
        self.spoken.lock().unwrap().push(utterance.clone());
        self.gate.pass().await;
        match &self.failure {
            Some(reason) => Err(carevoice::Error::Synthesis(reason.clone())),
            None => Ok(()),
        }
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

type Scripted = Result<Vec<Alternative>, RecognitionFailure>;

/// Recognition engine replaying scripted results
pub struct FakeRecognizer {
    available: bool,
    gate: Gate,
    results: Mutex<VecDeque<Scripted>>,
    languages: Mutex<Vec<String>>,
    aborts: AtomicUsize,
}

impl FakeRecognizer {
    pub fn new() -> Self {
        Self {
            available: true,
            gate: Gate::open(),
            results: Mutex::new(VecDeque::new()),
            languages: Mutex::new(Vec::new()),
            aborts: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn gated(mut self, gate: Gate) -> Self {
        self.gate = gate;
        self
    }

    /// Queue a recognized transcript
    pub fn hears(self, transcript: &str) -> Self {
        self.results
            .lock()
            .unwrap()
            .push_back(Ok(vec![Alternative::new(transcript, 0.9)]));
        self
    }

    /// Queue one result carrying several ranked alternatives
    pub fn hears_alternatives(self, alternatives: &[(&str, f32)]) -> Self {
        let alternatives = alternatives
            .iter()
            .map(|(transcript, confidence)| Alternative::new(transcript, *confidence))
            .collect();
        self.results.lock().unwrap().push_back(Ok(alternatives));
        self
    }

    /// Queue a failure
    pub fn fails(self, failure: RecognitionFailure) -> Self {
        self.results.lock().unwrap().push_back(Err(failure));
        self
    }

    /// Languages each session was started in
    pub fn languages(&self) -> Vec<String> {
        self.languages.lock().unwrap().clone()
    }

    pub fn abort_count(&self) -> usize {
        self.aborts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecognitionBackend for FakeRecognizer {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn recognize(&self, lang: &str) -> Result<Vec<Alternative>, RecognitionFailure> {
        self.languages.lock().unwrap().push(lang.to_string());
        self.gate.pass().await;
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(RecognitionFailure::NoSpeech))
    }

    fn abort(&self) {
        self.aborts.fetch_add(1, Ordering::SeqCst);
    }
}

/// Notifier that keeps every toast
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(String, Severity)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(String, Severity)> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        self.messages
            .lock()
            .unwrap()
            .push((message.to_string(), severity));
    }
}

/// Locale sink that keeps every update
#[derive(Default)]
pub struct RecordingLocaleSink {
    codes: Mutex<Vec<String>>,
}

impl RecordingLocaleSink {
    pub fn codes(&self) -> Vec<String> {
        self.codes.lock().unwrap().clone()
    }
}

impl LocaleSink for RecordingLocaleSink {
    fn set_locale(&self, code: &str) {
        self.codes.lock().unwrap().push(code.to_string());
    }
}

/// Session whose stored language is `code`
pub fn session_in(code: &str, notifier: Arc<RecordingNotifier>) -> LanguageSession {
    let store: Arc<dyn PreferenceStore> = Arc::new(MemoryStore::with(LANGUAGE_KEY, code));
    LanguageSession::builder(store)
        .notifier(notifier)
        .speech_supported(true)
        .initialize()
}

/// Poll `condition` until it holds, panicking after a second
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
