//! Default configuration constants for hark.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and provides a good balance
/// between quality and computational efficiency for voice applications.
pub const SAMPLE_RATE: u32 = 16000;

/// Default endpointer frame duration in milliseconds.
///
/// 30ms at 16kHz gives 480-sample frames, the atomic unit every component
/// consumes: the frame source reads one frame per call, the endpoint detector
/// classifies one frame per call, the decoder is fed one frame per call.
pub const FRAME_MS: u32 = 30;

/// Default speech threshold for the endpoint detector.
///
/// This RMS-based threshold (0.0 to 1.0) determines when a frame is classified
/// as speech. A value of 0.02 is tuned for typical microphone input levels and
/// provides good sensitivity while filtering out background noise.
pub const SPEECH_THRESHOLD: f32 = 0.02;

/// Default trailing silence in milliseconds before an utterance is closed.
///
/// 900ms allows for natural pauses in speech without prematurely
/// ending the utterance.
pub const TRAILING_SILENCE_MS: u32 = 900;

/// Default acoustic model path.
pub const DEFAULT_ACOUSTIC_MODEL: &str = "models/ggml-base.bin";

/// Default language code for decoding.
///
/// "auto" lets the engine detect the spoken language automatically.
/// Set to a specific code (e.g., "en", "de") to force a language.
pub const DEFAULT_LANGUAGE: &str = "auto";

/// Language value that triggers automatic language detection.
pub const AUTO_LANGUAGE: &str = "auto";

/// How long a blocking microphone read may stall before it is reported as a
/// device error rather than waiting forever on a dead stream.
pub const READ_STALL_TIMEOUT_MS: u64 = 5000;

/// Report the GPU backend compiled into this build.
///
/// Returns a human-readable name based on the compile-time feature flags.
/// Only one GPU backend can be active at a time; if none is enabled, returns "CPU".
pub fn gpu_backend() -> &'static str {
    if cfg!(feature = "cuda") {
        "CUDA"
    } else if cfg!(feature = "vulkan") {
        "Vulkan"
    } else if cfg!(feature = "hipblas") {
        "HipBLAS (AMD)"
    } else if cfg!(feature = "openblas") {
        "OpenBLAS"
    } else {
        "CPU"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_frame_is_480_samples() {
        assert_eq!(SAMPLE_RATE * FRAME_MS / 1000, 480);
    }

    #[test]
    fn gpu_backend_matches_compiled_feature() {
        let expected = if cfg!(feature = "cuda") {
            "CUDA"
        } else if cfg!(feature = "vulkan") {
            "Vulkan"
        } else if cfg!(feature = "hipblas") {
            "HipBLAS (AMD)"
        } else if cfg!(feature = "openblas") {
            "OpenBLAS"
        } else {
            "CPU"
        };
        assert_eq!(gpu_backend(), expected);
    }
}
