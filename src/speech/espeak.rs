//! `espeak-ng` synthesis backend
//!
//! Voices come from `espeak-ng --voices`; each utterance runs one child
//! process fed through stdin. Cancelling kills the child.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::oneshot;

use crate::speech::output::SynthesisBackend;
use crate::speech::voice::{Utterance, Voice};
use crate::{Error, Result};

/// Default program name looked up on `PATH`
pub const DEFAULT_PROGRAM: &str = "espeak-ng";

/// espeak-ng default speaking rate in words per minute
const BASE_WPM: f32 = 175.0;

/// Synthesis through a local espeak-ng binary
pub struct EspeakBackend {
    program: Option<PathBuf>,
    playing: Mutex<Option<oneshot::Sender<()>>>,
}

impl EspeakBackend {
    /// Resolve `program` on `PATH`; unavailable when it cannot be found
    #[must_use]
    pub fn new(program: &str) -> Self {
        let program = which::which(program).ok();
        if program.is_none() {
            tracing::debug!("espeak-ng not found, speech synthesis unavailable");
        }
        Self {
            program,
            playing: Mutex::new(None),
        }
    }

    fn program(&self) -> Result<&PathBuf> {
        self.program
            .as_ref()
            .ok_or_else(|| Error::Synthesis("espeak-ng is not installed".to_string()))
    }
}

impl Default for EspeakBackend {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

/// Parse the table printed by `espeak-ng --voices`
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  en-us           --/M      English_(America)  gmw/en-US            (en 2)
/// ```
#[must_use]
pub fn parse_voices(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let _priority = cols.next()?;
            let lang = cols.next()?;
            let _age_gender = cols.next()?;
            let name = cols.next()?;
            Some(Voice::new(lang, &name.replace('_', " "), lang))
        })
        .collect()
}

/// espeak-ng arguments for an utterance's voice and prosody
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn speak_args(utterance: &Utterance) -> Vec<String> {
    let voice = utterance
        .voice
        .as_ref()
        .map_or_else(|| utterance.lang.to_lowercase(), |v| v.id.clone());
    let wpm = (BASE_WPM * utterance.rate.clamp(0.1, 10.0)).round() as u32;
    let pitch = (50.0 * utterance.pitch.clamp(0.0, 2.0)).round().min(99.0) as u32;
    let amplitude = (100.0 * utterance.volume.clamp(0.0, 1.0)).round() as u32;

    vec![
        "-v".to_string(),
        voice,
        "-s".to_string(),
        wpm.to_string(),
        "-p".to_string(),
        pitch.to_string(),
        "-a".to_string(),
        amplitude.to_string(),
        "--stdin".to_string(),
    ]
}

#[async_trait]
impl SynthesisBackend for EspeakBackend {
    fn is_available(&self) -> bool {
        self.program.is_some()
    }

    async fn voices(&self) -> Result<Vec<Voice>> {
        let output = Command::new(self.program()?)
            .arg("--voices")
            .stdin(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            return Err(Error::Synthesis(format!(
                "espeak-ng --voices exited with {}",
                output.status
            )));
        }

        Ok(parse_voices(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn speak(&self, utterance: &Utterance) -> Result<()> {
        let mut child = Command::new(self.program()?)
            .args(speak_args(utterance))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(utterance.text.as_bytes()).await?;
        }

        let (tx, rx) = oneshot::channel();
        if let Ok(mut playing) = self.playing.lock() {
            *playing = Some(tx);
        }

        tokio::select! {
            _ = rx => {
                child.kill().await?;
                Err(Error::Interrupted)
            }
            status = child.wait() => {
                let status = status?;
                if status.success() {
                    Ok(())
                } else {
                    Err(Error::Synthesis(format!("espeak-ng exited with {status}")))
                }
            }
        }
    }

    fn cancel(&self) {
        if let Some(tx) = self.playing.lock().ok().and_then(|mut p| p.take()) {
            let _ = tx.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  en-us           --/M      English_(America)  gmw/en-US            (en 2)
 5  hi              --/M      Hindi              inc/hi
 5  ta              --/M      Tamil              dra/ta
";

    #[test]
    fn parses_voice_listing() {
        let voices = parse_voices(LISTING);
        assert_eq!(voices.len(), 3);
        assert_eq!(voices[0].lang, "en-us");
        assert_eq!(voices[0].name, "English (America)");
        assert_eq!(voices[2].language_prefix(), "ta");
    }

    #[test]
    fn args_map_prosody() {
        let mut utterance = Utterance::new("hello", "en-US");
        utterance.rate = 2.0;
        utterance.volume = 0.5;
        let args = speak_args(&utterance);
        assert_eq!(
            args,
            ["-v", "en-us", "-s", "350", "-p", "50", "-a", "50", "--stdin"]
        );
    }

    #[test]
    fn args_prefer_voice_id() {
        let mut utterance = Utterance::new("namaste", "hi-IN");
        utterance.voice = Some(Voice::new("hi", "Hindi", "hi"));
        assert_eq!(speak_args(&utterance)[1], "hi");
    }
}
