//! Endpoint detection: per-frame speech classification and utterance boundaries.
//!
//! The detector consumes fixed-size frames one at a time, classifies each as
//! speech or non-speech by RMS energy, and tracks whether an utterance is
//! currently open. Trailing silence is bridged for a configurable budget so
//! natural pauses don't split an utterance.

use crate::defaults;
use crate::error::{HarkError, Result};

/// Configuration for the endpoint detector.
#[derive(Debug, Clone, Copy)]
pub struct EndpointConfig {
    /// Sample rate of incoming audio in Hz.
    pub sample_rate: u32,
    /// Frame duration in milliseconds.
    pub frame_ms: u32,
    /// RMS threshold above which a frame counts as speech (0.0 to 1.0).
    pub speech_threshold: f32,
    /// Silence tolerated inside an utterance before it is closed (milliseconds).
    pub trailing_silence_ms: u32,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            frame_ms: defaults::FRAME_MS,
            speech_threshold: defaults::SPEECH_THRESHOLD,
            trailing_silence_ms: defaults::TRAILING_SILENCE_MS,
        }
    }
}

impl EndpointConfig {
    /// Number of samples in one frame.
    pub fn frame_size(&self) -> usize {
        (self.sample_rate * self.frame_ms / 1000) as usize
    }

    fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(HarkError::Endpoint {
                message: "sample_rate must be positive".to_string(),
            });
        }
        if self.frame_ms == 0 || self.frame_size() == 0 {
            return Err(HarkError::Endpoint {
                message: "frame_ms too small for the sample rate".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.speech_threshold) {
            return Err(HarkError::Endpoint {
                message: format!(
                    "speech_threshold must be within 0.0..=1.0, got {}",
                    self.speech_threshold
                ),
            });
        }
        if self.trailing_silence_ms == 0 {
            return Err(HarkError::Endpoint {
                message: "trailing_silence_ms must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Endpoint detector state machine.
///
/// `classify` returns `Some(frame)` for every frame that belongs to the
/// current utterance: the opening speech frame, voiced frames, silence bridged
/// within the trailing budget, and the single closing frame on which the
/// budget expires. `in_speech()` reflects state after the most recent
/// `classify` call; it turns false exactly on the closing frame, which is how
/// callers observe the utterance end while still receiving that final frame.
pub struct EndpointDetector {
    config: EndpointConfig,
    frame_size: usize,
    trailing_frames: u32,
    in_speech: bool,
    silence_run: u32,
}

impl EndpointDetector {
    /// Create a detector, validating the configuration.
    pub fn new(config: EndpointConfig) -> Result<Self> {
        config.validate()?;
        let frame_size = config.frame_size();
        // At least one full silent frame is required to close an utterance
        let trailing_frames = config.trailing_silence_ms.div_ceil(config.frame_ms).max(1);
        Ok(Self {
            config,
            frame_size,
            trailing_frames,
            in_speech: false,
            silence_run: 0,
        })
    }

    /// Number of samples the detector expects per frame.
    ///
    /// Callers size their reads from this; feeding a frame of any other
    /// length is a contract violation.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// The configuration the detector was built with.
    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    /// Classify one frame.
    ///
    /// Returns the frame back if it belongs to an utterance, `None` while
    /// idle. Must be called before `in_speech()` for the same frame.
    pub fn classify<'a>(&mut self, frame: &'a [i16]) -> Option<&'a [i16]> {
        debug_assert_eq!(frame.len(), self.frame_size, "frame size mismatch");

        let voiced = calculate_rms(frame) > self.config.speech_threshold;

        if !self.in_speech {
            if voiced {
                self.in_speech = true;
                self.silence_run = 0;
                Some(frame)
            } else {
                None
            }
        } else if voiced {
            self.silence_run = 0;
            Some(frame)
        } else {
            self.silence_run += 1;
            if self.silence_run >= self.trailing_frames {
                // Closing frame: still part of the utterance, but the
                // in-speech flag drops so the caller can end it.
                self.in_speech = false;
                self.silence_run = 0;
            }
            Some(frame)
        }
    }

    /// Whether an utterance is open after the most recent `classify` call.
    pub fn in_speech(&self) -> bool {
        self.in_speech
    }

    /// Rearm the detector for a new recognition pass.
    pub fn reset(&mut self) {
        self.in_speech = false;
        self.silence_run = 0;
    }
}

/// Calculates the Root Mean Square (RMS) of audio samples.
///
/// # Arguments
/// * `samples` - Audio samples as 16-bit PCM
///
/// # Returns
/// Normalized RMS value (0.0 to 1.0), where:
/// - 0.0 represents silence
/// - ~0.707 represents a full-scale sine wave
/// - 1.0 represents maximum amplitude
pub fn calculate_rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples
        .iter()
        .map(|&sample| {
            let normalized = sample as f64 / i16::MAX as f64;
            normalized * normalized
        })
        .sum();

    let mean_square = sum_squares / samples.len() as f64;
    mean_square.sqrt() as f32
}
