//! Command-line interface for hark
//!
//! Provides argument parsing using clap derive macros.

use crate::config::Config;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Streaming microphone speech recognition
#[derive(Parser, Debug)]
#[command(
    name = "hark",
    version,
    about = "Streaming microphone speech recognition"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress status output (print only the transcription)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: confidence and device info)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Audio input device (e.g., pipewire)
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// Path to the acoustic model
    #[arg(long, value_name = "PATH")]
    pub acoustic_model: Option<PathBuf>,

    /// Path to a language model, for engines that consume one
    #[arg(long, value_name = "PATH")]
    pub language_model: Option<PathBuf>,

    /// Path to a pronunciation dictionary, for engines that consume one
    #[arg(long, value_name = "PATH")]
    pub dictionary: Option<PathBuf>,

    /// Language code (default: auto-detect). Examples: auto, en, de, es, fr
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// RMS speech threshold for the endpoint detector (0.0 to 1.0)
    #[arg(long, value_name = "THRESHOLD")]
    pub threshold: Option<f32>,

    /// Trailing silence that closes an utterance. Examples: 900ms, 2s
    #[arg(long, value_name = "DURATION", value_parser = parse_duration_ms)]
    pub trailing_silence: Option<u64>,

    /// Give up when no speech starts within this long. Examples: 10s, 1m
    #[arg(long, value_name = "DURATION", value_parser = parse_duration_ms)]
    pub max_silence: Option<u64>,

    /// Keep recognizing utterances until interrupted (default: one and exit)
    #[arg(long)]
    pub continuous: bool,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Parse a duration string into milliseconds.
///
/// Supports any duration format accepted by `humantime` (`900ms`, `2s`,
/// `1m30s`) plus bare numbers, read as milliseconds.
fn parse_duration_ms(s: &str) -> Result<u64, String> {
    let s = s.trim();
    // Bare number → milliseconds
    if let Ok(ms) = s.parse::<u64>() {
        return Ok(ms);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_millis() as u64)
        .map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available audio input devices
    Devices,

    /// View and modify configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the active configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
    /// Write a default configuration file
    Init,
}

impl Cli {
    /// Fold command-line overrides into a loaded configuration.
    pub fn apply_to_config(&self, config: &mut Config) {
        if let Some(device) = &self.device {
            config.audio.device = Some(device.clone());
        }
        if let Some(path) = &self.acoustic_model {
            config.model.acoustic_model = path.clone();
        }
        if let Some(path) = &self.language_model {
            config.model.language_model = Some(path.clone());
        }
        if let Some(path) = &self.dictionary {
            config.model.dictionary = Some(path.clone());
        }
        if let Some(language) = &self.language {
            config.model.language = language.clone();
        }
        if let Some(threshold) = self.threshold {
            config.endpoint.speech_threshold = threshold;
        }
        if let Some(ms) = self.trailing_silence {
            config.endpoint.trailing_silence_ms = ms as u32;
        }
        if let Some(ms) = self.max_silence {
            config.endpoint.max_leading_silence_ms = Some(ms);
        }
    }
}
