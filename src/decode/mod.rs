//! Acoustic decoding: engine trait, utterance-scoped sessions, backends.

pub mod engine;
pub mod session;
pub mod whisper;

pub use engine::{DecoderEngine, Hypothesis, MockDecoderEngine};
pub use session::DecodingSession;
