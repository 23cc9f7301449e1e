//! Configuration management for carevoice
//!
//! Layers, lowest priority first: built-in defaults, the TOML config file,
//! environment variables.

pub mod file;

use std::path::PathBuf;

use secrecy::SecretString;

use crate::i18n;
use crate::navigation::{AssistantKind, RouteTable};
use crate::speech::Prosody;
use crate::speech::endpoint::EndpointConfig;
use crate::speech::capture::SAMPLE_RATE;
use crate::speech::whisper::DEFAULT_WHISPER_URL;
use crate::{Error, Result};

use self::file::CareVoiceConfigFile;

/// carevoice configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the preferences database
    pub data_dir: PathBuf,

    /// Language selection
    pub language: LanguageConfig,

    /// Speech output
    pub speech: SpeechConfig,

    /// Speech input
    pub recognition: RecognitionConfig,

    /// Route table overrides
    pub assistants: AssistantsConfig,
}

/// Language selection configuration
#[derive(Debug, Clone, Default)]
pub struct LanguageConfig {
    /// Locale override (`CAREVOICE_LANGUAGE`); defaults to the process locale
    pub locale: Option<String>,
}

/// Speech output configuration
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// espeak-ng program name or path
    pub espeak_program: String,

    /// Prosody applied to every utterance
    pub prosody: Prosody,
}

/// Speech input configuration
#[derive(Debug, Clone)]
pub struct RecognitionConfig {
    /// Whisper model identifier
    pub model: String,

    /// Transcription endpoint
    pub url: String,

    /// API key (`OPENAI_API_KEY`)
    pub api_key: Option<SecretString>,

    /// Trailing silence that ends an utterance
    pub silence_ms: u64,

    /// Window without speech after which a session gives up
    pub no_speech_ms: u64,
}

/// Per-assistant route tables
#[derive(Debug, Clone, Default)]
pub struct AssistantsConfig {
    pub floating: Option<RouteTable>,
    pub navigation: Option<RouteTable>,
}

impl AssistantsConfig {
    /// Route table for `kind`: override if configured, else built-in
    #[must_use]
    pub fn table(&self, kind: AssistantKind) -> RouteTable {
        let configured = match kind {
            AssistantKind::Floating => self.floating.as_ref(),
            AssistantKind::Navigation => self.navigation.as_ref(),
        };
        configured.cloned().unwrap_or_else(|| kind.default_table())
    }
}

impl RecognitionConfig {
    /// Endpoint detection derived from the configured windows
    #[must_use]
    pub const fn endpoint(&self) -> EndpointConfig {
        EndpointConfig::for_rate(SAMPLE_RATE).with_windows(
            SAMPLE_RATE,
            self.silence_ms,
            self.no_speech_ms,
        )
    }
}

/// Default data directory: `~/.local/share/carevoice` on Linux
#[must_use]
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("dev", "carevoice", "carevoice")
        .map_or_else(|| PathBuf::from(".carevoice"), |d| d.data_dir().to_path_buf())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            language: LanguageConfig::default(),
            speech: SpeechConfig {
                espeak_program: crate::speech::espeak::DEFAULT_PROGRAM.to_string(),
                prosody: Prosody::default(),
            },
            recognition: RecognitionConfig {
                model: "whisper-1".to_string(),
                url: DEFAULT_WHISPER_URL.to_string(),
                api_key: None,
                silence_ms: 800,
                no_speech_ms: 5000,
            },
            assistants: AssistantsConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the config file and environment
    ///
    /// # Errors
    ///
    /// Returns error if a configured value is out of range
    pub fn load() -> Result<Self> {
        let file = file::load_config_file();
        let mut config = Self::from_file(file)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with a parsed config file
    ///
    /// # Errors
    ///
    /// Returns error if a configured value is out of range
    pub fn from_file(file: CareVoiceConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(dir) = file.data_dir {
            config.data_dir = PathBuf::from(dir);
        }
        config.language.locale = file.language.locale;

        if let Some(program) = file.speech.espeak {
            config.speech.espeak_program = program;
        }
        let prosody = &mut config.speech.prosody;
        prosody.rate = file.speech.rate.unwrap_or(prosody.rate);
        prosody.pitch = file.speech.pitch.unwrap_or(prosody.pitch);
        prosody.volume = file.speech.volume.unwrap_or(prosody.volume);

        let recognition = &mut config.recognition;
        if let Some(model) = file.recognition.model {
            recognition.model = model;
        }
        if let Some(url) = file.recognition.url {
            recognition.url = url;
        }
        recognition.api_key = file.recognition.api_key.map(SecretString::from);
        recognition.silence_ms = file.recognition.silence_ms.unwrap_or(recognition.silence_ms);
        recognition.no_speech_ms = file
            .recognition
            .no_speech_ms
            .unwrap_or(recognition.no_speech_ms);

        config.assistants.floating = file
            .assistants
            .floating
            .map(|a| RouteTable::new(a.routes))
            .filter(|t| !t.is_empty());
        config.assistants.navigation = file
            .assistants
            .navigation
            .map(|a| RouteTable::new(a.routes))
            .filter(|t| !t.is_empty());

        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var("CAREVOICE_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(locale) = std::env::var("CAREVOICE_LANGUAGE") {
            self.language.locale = Some(locale);
        }
        if let Ok(program) = std::env::var("CAREVOICE_ESPEAK") {
            self.speech.espeak_program = program;
        }
        if let Ok(model) = std::env::var("CAREVOICE_STT_MODEL") {
            self.recognition.model = model;
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                self.recognition.api_key = Some(SecretString::from(key));
            }
        }
    }

    fn validate(&self) -> Result<()> {
        let prosody = self.speech.prosody;
        if !(0.1..=10.0).contains(&prosody.rate) {
            return Err(Error::Config(format!(
                "speech rate must be between 0.1 and 10, got {}",
                prosody.rate
            )));
        }
        if !(0.0..=2.0).contains(&prosody.pitch) {
            return Err(Error::Config(format!(
                "speech pitch must be between 0 and 2, got {}",
                prosody.pitch
            )));
        }
        if !(0.0..=1.0).contains(&prosody.volume) {
            return Err(Error::Config(format!(
                "speech volume must be between 0 and 1, got {}",
                prosody.volume
            )));
        }
        if self.recognition.silence_ms == 0 || self.recognition.no_speech_ms == 0 {
            return Err(Error::Config(
                "recognition windows must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Locale used to pick a language when none is stored
    #[must_use]
    pub fn runtime_locale(&self) -> Option<String> {
        self.language.locale.clone().or_else(i18n::runtime_locale)
    }

    /// Path of the preferences database
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("carevoice.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_overlays_defaults() {
        let file = file::parse_config(
            r#"
            data_dir = "/tmp/carevoice-test"

            [speech]
            rate = 1.5

            [[assistants.floating.routes]]
            path = "/reminders"
            phrases = ["Reminder"]
            "#,
        )
        .unwrap();

        let config = Config::from_file(file).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/carevoice-test"));
        assert!((config.speech.prosody.rate - 1.5).abs() < f32::EPSILON);
        assert!((config.speech.prosody.volume - 1.0).abs() < f32::EPSILON);
        assert_eq!(config.recognition.model, "whisper-1");

        let floating = config.assistants.table(AssistantKind::Floating);
        assert_eq!(floating.entries().len(), 1);
        assert_eq!(floating.entries()[0].phrases, ["reminder"]);
        assert_eq!(
            config.assistants.table(AssistantKind::Navigation),
            RouteTable::navigation_assistant()
        );
    }

    #[test]
    fn out_of_range_prosody_rejected() {
        let file = file::parse_config("[speech]\nvolume = 3.0\n").unwrap();
        assert!(matches!(Config::from_file(file), Err(Error::Config(_))));
    }

    #[test]
    fn endpoint_uses_windows() {
        let config = Config::default();
        let endpoint = config.recognition.endpoint();
        assert_eq!(endpoint.silence_samples, 12_800);
        assert_eq!(endpoint.no_speech_samples, 80_000);
    }
}
