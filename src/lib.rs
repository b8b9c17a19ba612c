//! hark - streaming microphone speech recognition
//!
//! Captures live audio, detects utterance boundaries with an endpoint
//! detector, and decodes each utterance to text.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod decode;
pub mod defaults;
pub mod endpoint;
pub mod error;
pub mod recognizer;

// Core traits (source → endpoint → decode)
pub use audio::source::{FrameSource, ScriptedFrameSource};
pub use decode::{DecoderEngine, DecodingSession, Hypothesis, MockDecoderEngine};
pub use endpoint::{EndpointConfig, EndpointDetector};

// Recognition
pub use recognizer::{CancelToken, RecognitionOutcome, Recognizer};

// Error handling
pub use error::{HarkError, Result};

// Config
pub use config::{Config, ModelConfig};

// Real decoder backend
pub use decode::whisper::WhisperEngine;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }

    #[test]
    fn version_string_contains_plus_when_git_hash_present() {
        let ver = version_string();
        if option_env!("GIT_HASH").is_some_and(|h| !h.is_empty()) {
            assert!(
                ver.contains('+'),
                "With GIT_HASH set, version should contain '+', got: {}",
                ver
            );
        } else {
            assert_eq!(ver, env!("CARGO_PKG_VERSION"));
        }
    }
}
