//! Synthesis voices, utterances and voice matching

use serde::Serialize;
use uuid::Uuid;

use crate::i18n::Language;

/// Speech tag forced onto utterances that fall back to English
pub const FALLBACK_SPEECH_CODE: &str = "en-US";

/// Languages that fall back to English silently, without an advisory
const SILENT_FALLBACK_CODES: [&str; 2] = ["en", "hi"];

/// A voice installed in the synthesis engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Voice {
    /// Engine-specific voice identifier
    pub id: String,
    /// Human readable name
    pub name: String,
    /// Language tag reported by the engine (e.g. "en-US", "hi_IN", "ta")
    pub lang: String,
}

impl Voice {
    #[must_use]
    pub fn new(id: &str, name: &str, lang: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            lang: lang.to_string(),
        }
    }

    /// Primary language subtag: lower-cased, `_` treated as `-`
    #[must_use]
    pub fn language_prefix(&self) -> String {
        normalize_tag(&self.lang)
            .split('-')
            .next()
            .unwrap_or_default()
            .to_string()
    }
}

/// Lower-case a language tag and normalize separators to `-`
#[must_use]
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().replace('_', "-").to_lowercase()
}

/// One text-to-speech playback request
#[derive(Debug, Clone, Serialize)]
pub struct Utterance {
    pub id: Uuid,
    pub text: String,
    /// BCP-47 language tag
    pub lang: String,
    pub voice: Option<Voice>,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Utterance {
    /// Utterance tagged with `lang` and neutral prosody
    #[must_use]
    pub fn new(text: &str, lang: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.to_string(),
            lang: lang.to_string(),
            voice: None,
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

/// Outcome of matching a language against the installed voices
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceChoice {
    /// A voice for the language itself
    Native(Voice),
    /// No voice for the language; English voice (if any) and whether to warn
    EnglishFallback { voice: Option<Voice>, advise: bool },
}

/// Find a voice for `language`
///
/// Exact speech tag match first, then a voice whose primary subtag equals
/// the language code.
#[must_use]
pub fn find_voice<'a>(voices: &'a [Voice], language: &Language) -> Option<&'a Voice> {
    voices
        .iter()
        .find(|v| v.lang == language.speech_code)
        .or_else(|| {
            voices
                .iter()
                .find(|v| v.language_prefix() == language.code)
        })
}

/// Pick the English voice used for fallback: `en-US` exactly, else any `en*`
#[must_use]
pub fn find_english_voice(voices: &[Voice]) -> Option<&Voice> {
    voices
        .iter()
        .find(|v| normalize_tag(&v.lang) == "en-us")
        .or_else(|| voices.iter().find(|v| normalize_tag(&v.lang).starts_with("en")))
}

/// Decide which voice speaks `language`
#[must_use]
pub fn choose_voice(voices: &[Voice], language: &Language) -> VoiceChoice {
    if let Some(voice) = find_voice(voices, language) {
        return VoiceChoice::Native(voice.clone());
    }

    VoiceChoice::EnglishFallback {
        voice: find_english_voice(voices).cloned(),
        advise: !SILENT_FALLBACK_CODES.contains(&language.code),
    }
}
