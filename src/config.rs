use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub audio: AudioConfig,
    pub endpoint: EndpointSettings,
}

/// Model resource locations and decoding options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the acoustic model file
    pub acoustic_model: PathBuf,
    /// Optional language model, for engines that consume one
    pub language_model: Option<PathBuf>,
    /// Optional pronunciation dictionary, for engines that consume one
    pub dictionary: Option<PathBuf>,
    /// Language code, or "auto" to detect
    pub language: String,
    /// Inference threads (None = auto-detect)
    pub threads: Option<usize>,
}

/// Audio capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub device: Option<String>,
    pub sample_rate: u32,
}

/// Endpoint detector tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EndpointSettings {
    /// Frame duration in milliseconds
    pub frame_ms: u32,
    /// RMS threshold above which a frame counts as speech
    pub speech_threshold: f32,
    /// Trailing silence before an utterance is closed
    pub trailing_silence_ms: u32,
    /// Give up waiting for speech after this much leading silence
    /// (None = wait indefinitely, matching plain blocking capture)
    pub max_leading_silence_ms: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            acoustic_model: PathBuf::from(defaults::DEFAULT_ACOUSTIC_MODEL),
            language_model: None,
            dictionary: None,
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            threads: None,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: defaults::SAMPLE_RATE,
        }
    }
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            frame_ms: defaults::FRAME_MS,
            speech_threshold: defaults::SPEECH_THRESHOLD,
            trailing_silence_ms: defaults::TRAILING_SILENCE_MS,
            max_leading_silence_ms: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if the file doesn't exist
    ///
    /// Only falls back to defaults when the file is missing.
    /// Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - HARK_ACOUSTIC_MODEL → model.acoustic_model
    /// - HARK_LANGUAGE → model.language
    /// - HARK_AUDIO_DEVICE → audio.device
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("HARK_ACOUSTIC_MODEL")
            && !model.is_empty()
        {
            self.model.acoustic_model = PathBuf::from(model);
        }

        if let Ok(language) = std::env::var("HARK_LANGUAGE")
            && !language.is_empty()
        {
            self.model.language = language;
        }

        if let Ok(device) = std::env::var("HARK_AUDIO_DEVICE")
            && !device.is_empty()
        {
            self.audio.device = Some(device);
        }

        self
    }

    /// Build the endpoint detector configuration for this config.
    pub fn endpoint_config(&self) -> crate::endpoint::EndpointConfig {
        crate::endpoint::EndpointConfig {
            sample_rate: self.audio.sample_rate,
            frame_ms: self.endpoint.frame_ms,
            speech_threshold: self.endpoint.speech_threshold,
            trailing_silence_ms: self.endpoint.trailing_silence_ms,
        }
    }

    /// Serialize this configuration as TOML.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/hark/config.toml on Linux
    #[cfg(feature = "cli")]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("hark").join("config.toml"))
    }
}
