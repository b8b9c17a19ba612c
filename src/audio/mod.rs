//! Audio frame sources: microphone capture and WAV file playback.

#[cfg(feature = "cpal-audio")]
pub mod capture;
pub mod source;
pub mod wav;
