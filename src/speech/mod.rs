//! Speech output and input
//!
//! [`SpeechOutput`] and [`SpeechInput`] hold the session logic (voice
//! matching, fallback, most-recent-wins playback, single-session
//! recognition). Engines plug in through [`SynthesisBackend`] and
//! [`RecognitionBackend`]; `espeak-ng` and microphone + Whisper
//! implementations are provided.

pub mod capture;
pub mod endpoint;
pub mod espeak;
mod input;
mod output;
mod voice;
pub mod whisper;

pub use espeak::EspeakBackend;
pub use input::{
    ASSISTANT_LANGUAGE, Alternative, ListenGuard, ListenOutcome, RecognitionBackend,
    RecognitionFailure, SpeechInput,
};
pub use output::{Prosody, SpeechOutput, SynthesisBackend};
pub use voice::{
    FALLBACK_SPEECH_CODE, Utterance, Voice, VoiceChoice, choose_voice, find_english_voice,
    find_voice, normalize_tag,
};
pub use whisper::WhisperRecognizer;
