//! Whisper-based decoding engine.
//!
//! This module provides a Whisper implementation of the DecoderEngine trait
//! using whisper-rs. Fed frames are accumulated for the duration of an
//! utterance and decoded in one pass when the utterance ends.
//!
//! # Feature Gate
//!
//! This module requires the `whisper` feature to be enabled and cmake to be
//! installed. To build with Whisper support:
//!
//! ```bash
//! cargo build --features whisper
//! ```

use crate::config::ModelConfig;
use crate::decode::engine::{DecoderEngine, Hypothesis};
#[cfg(feature = "whisper")]
use crate::defaults;
use crate::error::{HarkError, Result};
use std::path::Path;

#[cfg(feature = "whisper")]
use std::sync::Once;
#[cfg(feature = "whisper")]
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, install_logging_hooks,
};

#[cfg(feature = "whisper")]
static LOGGING_HOOKS_INSTALLED: Once = Once::new();

/// Validate the model resource paths referenced by the configuration.
///
/// The acoustic model is required. Language model and dictionary are
/// locators for engines that consume them; when present they must exist,
/// the Whisper backend derives everything from the acoustic model alone.
fn validate_model_paths(config: &ModelConfig) -> Result<()> {
    let check = |path: &Path| -> Result<()> {
        if !path.exists() {
            return Err(HarkError::ModelNotFound {
                path: path.to_string_lossy().to_string(),
            });
        }
        Ok(())
    };

    check(&config.acoustic_model)?;
    if let Some(lm) = &config.language_model {
        check(lm)?;
    }
    if let Some(dict) = &config.dictionary {
        check(dict)?;
    }
    Ok(())
}

fn model_name_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Whisper-based decoding engine.
///
/// # Feature Gate
///
/// The real implementation is only available when the `whisper` feature is
/// enabled; without it a stub with the same constructor errors on use.
#[cfg(feature = "whisper")]
pub struct WhisperEngine {
    context: WhisperContext,
    config: ModelConfig,
    model_name: String,
    buffer: Vec<i16>,
    in_utterance: bool,
}

#[cfg(feature = "whisper")]
impl std::fmt::Debug for WhisperEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperEngine")
            .field("config", &self.config)
            .field("model_name", &self.model_name)
            .field("in_utterance", &self.in_utterance)
            .field("context", &"<WhisperContext>")
            .finish()
    }
}

/// Whisper-based decoding engine placeholder (without whisper feature).
///
/// This is a stub implementation that returns errors when used.
/// Enable the `whisper` feature to use real decoding.
#[cfg(not(feature = "whisper"))]
#[derive(Debug)]
pub struct WhisperEngine {
    config: ModelConfig,
    model_name: String,
}

#[cfg(feature = "whisper")]
impl WhisperEngine {
    /// Create a new Whisper engine.
    ///
    /// # Errors
    /// Returns `HarkError::ModelNotFound` if a referenced model file doesn't
    /// exist, `HarkError::DecoderInit` if model loading fails. Construction
    /// either fully succeeds or acquires nothing.
    pub fn new(config: ModelConfig) -> Result<Self> {
        // Install logging hooks to suppress whisper.cpp output (only once)
        LOGGING_HOOKS_INSTALLED.call_once(|| {
            install_logging_hooks();
        });

        validate_model_paths(&config)?;
        let model_name = model_name_from_path(&config.acoustic_model);

        let mut context_params = WhisperContextParameters::default();
        // Fused attention kernels avoid the standalone softmax CUDA kernel,
        // which crashes on Blackwell GPUs (sm_120) with ggml <= 1.7.6
        context_params.flash_attn(true);
        let context = WhisperContext::new_with_params(
            config
                .acoustic_model
                .to_str()
                .ok_or_else(|| HarkError::DecoderInit {
                    message: "Invalid UTF-8 in model path".to_string(),
                })?,
            context_params,
        )
        .map_err(|e| HarkError::DecoderInit {
            message: format!("Failed to load Whisper model: {}", e),
        })?;

        Ok(Self {
            context,
            config,
            model_name,
            buffer: Vec::new(),
            in_utterance: false,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn decode_buffer(&mut self) -> Result<Option<Hypothesis>> {
        if self.buffer.is_empty() {
            return Ok(None);
        }

        // Whisper expects f32 normalized to [-1.0, 1.0]
        let audio_f32 = convert_audio(&self.buffer);

        let mut state = self
            .context
            .create_state()
            .map_err(|e| HarkError::Decode {
                message: format!("Failed to create Whisper state: {}", e),
            })?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

        if self.config.language == defaults::AUTO_LANGUAGE {
            params.set_language(None);
        } else {
            params.set_language(Some(&self.config.language));
        }

        if let Some(threads) = self.config.threads {
            params.set_n_threads(threads as i32);
        }

        // Disable printing to stdout/stderr
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state.full(params, &audio_f32).map_err(|e| HarkError::Decode {
            message: format!("Whisper inference failed: {}", e),
        })?;

        // Extract transcribed text and compute confidence from segment probabilities
        let mut transcription = String::new();
        let mut confidence_sum = 0.0_f32;
        let mut segment_count = 0u32;
        for segment in state.as_iter() {
            transcription.push_str(&segment.to_string());
            // no_speech_probability is 0.0..1.0; confidence = 1 - no_speech_prob
            confidence_sum += 1.0 - segment.no_speech_probability();
            segment_count += 1;
        }

        let text = transcription.trim().to_string();
        if text.is_empty() {
            return Ok(None);
        }

        let confidence = if segment_count > 0 {
            (confidence_sum / segment_count as f32).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Ok(Some(Hypothesis { text, confidence }))
    }
}

#[cfg(not(feature = "whisper"))]
impl WhisperEngine {
    /// Create a new Whisper engine (stub implementation).
    ///
    /// Model paths are still validated so configuration errors surface the
    /// same way, but any decoding attempt reports the missing feature.
    pub fn new(config: ModelConfig) -> Result<Self> {
        validate_model_paths(&config)?;
        let model_name = model_name_from_path(&config.acoustic_model);
        Ok(Self { config, model_name })
    }

    /// Get the configuration
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}

/// Convert i16 audio samples to f32 normalized to [-1.0, 1.0]
///
/// Input is 16-bit PCM audio where samples range from -32768 to 32767.
pub fn convert_audio(samples: &[i16]) -> Vec<f32> {
    samples
        .iter()
        .map(|&sample| sample as f32 / 32768.0)
        .collect()
}

#[cfg(feature = "whisper")]
impl DecoderEngine for WhisperEngine {
    fn begin_utterance(&mut self) -> Result<()> {
        if self.in_utterance {
            return Err(HarkError::Decode {
                message: "begin_utterance while an utterance is open".to_string(),
            });
        }
        self.buffer.clear();
        self.in_utterance = true;
        Ok(())
    }

    fn feed(&mut self, frame: &[i16]) -> Result<()> {
        if !self.in_utterance {
            return Err(HarkError::Decode {
                message: "feed outside an open utterance".to_string(),
            });
        }
        self.buffer.extend_from_slice(frame);
        Ok(())
    }

    fn end_utterance(&mut self) -> Result<Option<Hypothesis>> {
        if !self.in_utterance {
            return Err(HarkError::Decode {
                message: "end_utterance without an open utterance".to_string(),
            });
        }
        self.in_utterance = false;
        let result = self.decode_buffer();
        self.buffer.clear();
        result
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(not(feature = "whisper"))]
impl DecoderEngine for WhisperEngine {
    fn begin_utterance(&mut self) -> Result<()> {
        Err(HarkError::Decode {
            message: concat!(
                "Whisper feature not enabled. This binary was built without speech recognition.\n",
                "To fix: cargo build --release (whisper is enabled by default)\n",
                "If build fails with cmake errors, install: sudo apt install cmake"
            )
            .to_string(),
        })
    }

    fn feed(&mut self, _frame: &[i16]) -> Result<()> {
        Err(HarkError::Decode {
            message: "Whisper feature not enabled".to_string(),
        })
    }

    fn end_utterance(&mut self) -> Result<Option<Hypothesis>> {
        Err(HarkError::Decode {
            message: "Whisper feature not enabled".to_string(),
        })
    }

    fn is_ready(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}
