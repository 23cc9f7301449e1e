//! TOML configuration file loading
//!
//! Supports `~/.config/carevoice/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::navigation::RouteEntry;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct CareVoiceConfigFile {
    /// Directory for the preferences database
    #[serde(default)]
    pub data_dir: Option<String>,

    #[serde(default)]
    pub language: LanguageFileConfig,

    #[serde(default)]
    pub speech: SpeechFileConfig,

    #[serde(default)]
    pub recognition: RecognitionFileConfig,

    #[serde(default)]
    pub assistants: AssistantsFileConfig,
}

/// Language selection
#[derive(Debug, Default, Deserialize)]
pub struct LanguageFileConfig {
    /// Locale used when no language is stored (overrides `LANG`)
    pub locale: Option<String>,
}

/// Speech output
#[derive(Debug, Default, Deserialize)]
pub struct SpeechFileConfig {
    /// espeak-ng program name or path
    pub espeak: Option<String>,
    pub rate: Option<f32>,
    pub pitch: Option<f32>,
    pub volume: Option<f32>,
}

/// Speech input
#[derive(Debug, Default, Deserialize)]
pub struct RecognitionFileConfig {
    /// Whisper model (e.g. "whisper-1")
    pub model: Option<String>,
    /// Transcription endpoint URL
    pub url: Option<String>,
    /// API key for the transcription endpoint
    pub api_key: Option<String>,
    /// Trailing silence that ends an utterance
    pub silence_ms: Option<u64>,
    /// Window without speech after which a session gives up
    pub no_speech_ms: Option<u64>,
}

/// Per-assistant route table overrides
#[derive(Debug, Default, Deserialize)]
pub struct AssistantsFileConfig {
    #[serde(default)]
    pub floating: Option<AssistantFileConfig>,

    #[serde(default)]
    pub navigation: Option<AssistantFileConfig>,
}

/// Replacement phrase table for one assistant
#[derive(Debug, Default, Deserialize)]
pub struct AssistantFileConfig {
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
}

/// Parse config file contents
///
/// # Errors
///
/// Returns error if the TOML is malformed or has the wrong shape
pub fn parse_config(content: &str) -> crate::Result<CareVoiceConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Load the TOML config file from the standard path
///
/// Returns `CareVoiceConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> CareVoiceConfigFile {
    config_file_path().map_or_else(CareVoiceConfigFile::default, |p| load_config_file_from(&p))
}

/// Load a TOML config file from `path`, falling back to defaults
pub fn load_config_file_from(path: &Path) -> CareVoiceConfigFile {
    if !path.exists() {
        return CareVoiceConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match parse_config(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                CareVoiceConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            CareVoiceConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/carevoice/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("carevoice").join("config.toml"))
}
