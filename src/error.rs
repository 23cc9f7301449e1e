//! Error types for carevoice

use std::fmt;

use thiserror::Error;

/// Result type alias for carevoice operations
pub type Result<T> = std::result::Result<T, Error>;

/// Runtime capability that may be missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Text-to-speech
    Synthesis,
    /// Speech-to-text
    Recognition,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Synthesis => f.write_str("speech synthesis"),
            Self::Recognition => f.write_str("speech recognition"),
        }
    }
}

/// Errors that can occur in carevoice
#[derive(Debug, Error)]
pub enum Error {
    /// Speech capability absent from the runtime
    #[error("{0} is not supported on this device")]
    Unsupported(Capability),

    /// Recognition ended without any speech
    #[error("no speech detected")]
    NoSpeechDetected,

    /// Any other recognition failure, reported verbatim
    #[error("recognition error: {0}")]
    Recognition(String),

    /// Playback failed mid-utterance
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Utterance was cancelled or superseded by a newer one
    #[error("speech interrupted")]
    Interrupted,

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl Error {
    /// Whether this error is a normal end of a speech session rather than a fault
    #[must_use]
    pub const fn is_benign(&self) -> bool {
        matches!(self, Self::Interrupted | Self::NoSpeechDetected)
    }
}
