//! Microphone + Whisper recognition backend

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::speech::capture::{self, CaptureResult, SAMPLE_RATE};
use crate::speech::endpoint::EndpointConfig;
use crate::speech::input::{Alternative, RecognitionBackend, RecognitionFailure};

/// Default transcription endpoint
pub const DEFAULT_WHISPER_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Response from the Whisper transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Stops one blocking capture when its `recognize` future is dropped
///
/// Every capture owns its flag, so ending one session never reaches a
/// capture started by another.
struct CaptureAbort {
    flag: Arc<AtomicBool>,
    armed: bool,
}

impl CaptureAbort {
    fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            armed: true,
        }
    }

    fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CaptureAbort {
    fn drop(&mut self) {
        if self.armed {
            self.flag.store(true, Ordering::Release);
            tracing::debug!("microphone capture abandoned");
        }
    }
}

/// Records one utterance from the default microphone and transcribes it
pub struct WhisperRecognizer {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    model: String,
    url: String,
    endpoint: EndpointConfig,
    microphone: bool,
}

impl WhisperRecognizer {
    /// Create a recognizer; unavailable when no key or no microphone is present
    #[must_use]
    pub fn new(api_key: Option<SecretString>, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.to_string(),
            url: DEFAULT_WHISPER_URL.to_string(),
            endpoint: EndpointConfig::for_rate(SAMPLE_RATE),
            microphone: capture::input_device_present(),
        }
    }

    /// Override the transcription URL (self-hosted Whisper servers)
    #[must_use]
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    /// Override endpoint detection windows
    #[must_use]
    pub const fn with_endpoint(mut self, endpoint: EndpointConfig) -> Self {
        self.endpoint = endpoint;
        self
    }

    async fn capture(&self) -> Result<Vec<f32>, RecognitionFailure> {
        let abort = CaptureAbort::new();
        let endpoint = self.endpoint;

        let captured = tokio::task::spawn_blocking({
            let flag = abort.flag();
            move || capture::record_utterance(endpoint, &flag)
        })
        .await
        .map_err(|e| RecognitionFailure::Other(e.to_string()))?;
        abort.disarm();

        match captured {
            Ok(CaptureResult::Utterance(samples)) => Ok(samples),
            Ok(CaptureResult::NoSpeech) => Err(RecognitionFailure::NoSpeech),
            Ok(CaptureResult::Aborted) => Err(RecognitionFailure::Aborted),
            Err(e) => {
                tracing::error!(error = %e, "microphone capture failed");
                Err(RecognitionFailure::Other(format!("audio-capture: {e}")))
            }
        }
    }

    async fn transcribe(&self, samples: &[f32], lang: &str) -> Result<String, RecognitionFailure> {
        let Some(api_key) = &self.api_key else {
            return Err(RecognitionFailure::NotAllowed);
        };

        let wav = capture::samples_to_wav(samples, SAMPLE_RATE)
            .map_err(|e| RecognitionFailure::Other(e.to_string()))?;
        tracing::debug!(audio_bytes = wav.len(), lang, "starting Whisper transcription");

        let file = reqwest::multipart::Part::bytes(wav)
            .file_name("utterance.wav")
            .mime_str("audio/wav")
            .map_err(|e| RecognitionFailure::Other(e.to_string()))?;

        let mut form = reqwest::multipart::Form::new()
            .part("file", file)
            .text("model", self.model.clone());
        if let Some(prefix) = lang.split(['-', '_']).next().filter(|p| !p.is_empty()) {
            form = form.text("language", prefix.to_lowercase());
        }

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Whisper request failed");
                RecognitionFailure::Network
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(RecognitionFailure::NotAllowed);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Whisper API error");
            return Err(RecognitionFailure::Other(format!(
                "Whisper API error {status}: {body}"
            )));
        }

        let body = response.text().await.map_err(|e| {
            tracing::error!(error = %e, "failed to read Whisper response");
            RecognitionFailure::Network
        })?;

        parse_transcript(&body)
    }
}

/// Extract the transcript from a Whisper response body
fn parse_transcript(body: &str) -> Result<String, RecognitionFailure> {
    serde_json::from_str::<WhisperResponse>(body)
        .map(|response| response.text)
        .map_err(|e| {
            tracing::error!(error = %e, "failed to parse Whisper response");
            RecognitionFailure::Other(format!("invalid response: {e}"))
        })
}

#[async_trait]
impl RecognitionBackend for WhisperRecognizer {
    fn is_available(&self) -> bool {
        self.microphone && self.api_key.is_some()
    }

    async fn recognize(&self, lang: &str) -> Result<Vec<Alternative>, RecognitionFailure> {
        let samples = self.capture().await?;
        let text = self.transcribe(&samples, lang).await?;

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Alternative::new(text.trim(), 1.0)])
    }

    fn abort(&self) {
        // the capture of the abandoned session stops when its future drops
        tracing::trace!("Whisper recognition aborted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropped_capture_stops_only_itself() {
        let first = CaptureAbort::new();
        let second = CaptureAbort::new();
        let (first_flag, second_flag) = (first.flag(), second.flag());

        drop(first);
        assert!(first_flag.load(Ordering::Acquire));
        assert!(!second_flag.load(Ordering::Acquire));

        // a later capture starts clear even after an earlier abort
        let third = CaptureAbort::new();
        assert!(!third.flag().load(Ordering::Acquire));
        drop(second);
        assert!(!third.flag().load(Ordering::Acquire));
        third.disarm();
    }

    #[test]
    fn test_finished_capture_is_not_flagged() {
        let capture = CaptureAbort::new();
        let flag = capture.flag();
        capture.disarm();
        assert!(!flag.load(Ordering::Acquire));
    }

    #[test]
    fn test_transcript_is_parsed() {
        assert_eq!(
            parse_transcript(r#"{"text":"go to my lab tests"}"#).unwrap(),
            "go to my lab tests"
        );
    }

    #[test]
    fn test_malformed_body_is_not_a_network_error() {
        for body in ["<html>bad gateway</html>", "{}", ""] {
            let failure = parse_transcript(body).unwrap_err();
            let RecognitionFailure::Other(reason) = &failure else {
                panic!("{body:?}: {failure:?}");
            };
            assert!(reason.starts_with("invalid response"), "{reason}");
            assert_ne!(failure, RecognitionFailure::Network);
        }
    }
}
