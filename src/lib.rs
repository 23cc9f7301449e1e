//! carevoice - multilingual speech and voice navigation core
//!
//! This library provides the speech subsystem of a patient-facing health
//! application:
//! - Language catalog, translation tables and the active language session
//! - Text-to-speech with voice matching and English fallback
//! - Single-shot speech recognition
//! - Voice command routing for the floating and navigation assistants
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 Host application                     │
//! │    Router  │  Toasts  │  Document locale  │  Storage │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                    carevoice                         │
//! │  Language session │ Speech out │ Speech in │ Routes │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Speech engines                       │
//! │        espeak-ng  │  Microphone + Whisper            │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod host;
pub mod i18n;
pub mod navigation;
pub mod runtime;
pub mod session;
pub mod speech;
pub mod store;

pub use config::Config;
pub use error::{Capability, Error, Result};
pub use host::{LocaleSink, MemoryRouter, Notifier, Router, Severity};
pub use i18n::{Language, LocalizationStore};
pub use navigation::{
    AssistantKind, AssistantState, RouteEntry, RouteOutcome, RouteTable, VoiceAssistant,
};
pub use runtime::{Collaborators, Runtime};
pub use session::LanguageSession;
pub use speech::{
    ListenOutcome, RecognitionBackend, SpeechInput, SpeechOutput, SynthesisBackend, Utterance,
    Voice,
};
pub use store::{MemoryStore, PreferenceStore};
