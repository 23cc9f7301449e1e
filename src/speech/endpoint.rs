//! Utterance endpoint detection
//!
//! Decides when a single utterance has ended by tracking RMS energy of the
//! captured audio: speech followed by enough silence completes it, and a
//! window with no speech at all ends the session as "no speech".

/// Tuning for the endpoint detector, in samples at the capture rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndpointConfig {
    /// RMS energy above which a chunk counts as speech
    pub energy_threshold: f32,
    /// Minimum buffered audio before an utterance may complete
    pub min_speech_samples: usize,
    /// Trailing silence that ends an utterance
    pub silence_samples: usize,
    /// Leading silence after which the session gives up
    pub no_speech_samples: usize,
}

impl EndpointConfig {
    /// Defaults scaled to `sample_rate`: 0.3s speech, 0.8s silence, 5s no-speech window
    #[must_use]
    pub const fn for_rate(sample_rate: u32) -> Self {
        let rate = sample_rate as usize;
        Self {
            energy_threshold: 0.03,
            min_speech_samples: rate * 3 / 10,
            silence_samples: rate * 8 / 10,
            no_speech_samples: rate * 5,
        }
    }

    /// Override silence and no-speech windows from milliseconds
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub const fn with_windows(
        mut self,
        sample_rate: u32,
        silence_ms: u64,
        no_speech_ms: u64,
    ) -> Self {
        let rate = sample_rate as u64;
        self.silence_samples = (rate * silence_ms / 1000) as usize;
        self.no_speech_samples = (rate * no_speech_ms / 1000) as usize;
        self
    }
}

/// Detector state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointState {
    /// Waiting for the first speech
    Waiting,
    /// Speech seen, accumulating the utterance
    Speaking,
}

/// Result of feeding a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointEvent {
    /// Keep capturing
    Pending,
    /// Utterance finished; take the buffer
    Complete,
    /// Nothing was said within the window
    NoSpeech,
}

/// Accumulates one utterance and reports when it ends
pub struct EndpointDetector {
    config: EndpointConfig,
    state: EndpointState,
    buffer: Vec<f32>,
    silence: usize,
    waited: usize,
}

impl EndpointDetector {
    #[must_use]
    pub const fn new(config: EndpointConfig) -> Self {
        Self {
            config,
            state: EndpointState::Waiting,
            buffer: Vec::new(),
            silence: 0,
            waited: 0,
        }
    }

    /// Feed captured samples
    pub fn process(&mut self, samples: &[f32]) -> EndpointEvent {
        if samples.is_empty() {
            return EndpointEvent::Pending;
        }

        let energy = rms(samples);
        let is_speech = energy > self.config.energy_threshold;

        match self.state {
            EndpointState::Waiting => {
                if is_speech {
                    self.state = EndpointState::Speaking;
                    self.buffer.extend_from_slice(samples);
                    self.silence = 0;
                    tracing::trace!(energy, "speech started");
                } else {
                    self.waited += samples.len();
                    if self.waited > self.config.no_speech_samples {
                        tracing::debug!(waited = self.waited, "no speech within window");
                        return EndpointEvent::NoSpeech;
                    }
                }
            }
            EndpointState::Speaking => {
                self.buffer.extend_from_slice(samples);
                if is_speech {
                    self.silence = 0;
                } else {
                    self.silence += samples.len();
                }

                if self.silence > self.config.silence_samples
                    && self.buffer.len() > self.config.min_speech_samples
                {
                    tracing::debug!(samples = self.buffer.len(), "utterance complete");
                    return EndpointEvent::Complete;
                }
            }
        }

        EndpointEvent::Pending
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> EndpointState {
        self.state
    }

    /// Take the captured utterance and reset
    pub fn take_utterance(&mut self) -> Vec<f32> {
        self.state = EndpointState::Waiting;
        self.silence = 0;
        self.waited = 0;
        std::mem::take(&mut self.buffer)
    }
}

/// RMS energy of a chunk
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
