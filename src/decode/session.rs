//! Single-use decoding sessions.
//!
//! A [`DecodingSession`] is the only way the rest of the crate talks to a
//! [`DecoderEngine`] during an utterance. The open→feed*→close protocol is
//! enforced by construction: a session can only be created via `open`,
//! `close` consumes it, and dropping an unclosed session ends the utterance
//! on the engine so no exit path leaves the engine mid-utterance.

use crate::decode::engine::{DecoderEngine, Hypothesis};
use crate::error::Result;

/// One open utterance's decoding state. Single-use.
pub struct DecodingSession<'a> {
    engine: &'a mut dyn DecoderEngine,
    frames_fed: u64,
    finished: bool,
}

impl<'a> DecodingSession<'a> {
    /// Open a session on the engine.
    ///
    /// # Errors
    /// Fails if the engine cannot begin an utterance; no session exists then.
    pub fn open(engine: &'a mut dyn DecoderEngine) -> Result<Self> {
        engine.begin_utterance()?;
        Ok(Self {
            engine,
            frames_fed: 0,
            finished: false,
        })
    }

    /// Feed one frame of in-speech audio, in capture order.
    pub fn feed(&mut self, frame: &[i16]) -> Result<()> {
        self.engine.feed(frame)?;
        self.frames_fed += 1;
        Ok(())
    }

    /// Number of frames fed so far.
    pub fn frames_fed(&self) -> u64 {
        self.frames_fed
    }

    /// Close the session and retrieve the hypothesis.
    ///
    /// Consumes the session, so there is no way to feed after close.
    /// A hypothesis with whitespace-only text is normalized to `None`.
    pub fn close(mut self) -> Result<Option<Hypothesis>> {
        self.finished = true;
        let hypothesis = self.engine.end_utterance()?;
        Ok(hypothesis.filter(|h| !h.text.trim().is_empty()))
    }
}

impl Drop for DecodingSession<'_> {
    fn drop(&mut self) {
        if !self.finished {
            // Abandoned session: end the utterance for engine hygiene,
            // discarding whatever hypothesis it produced.
            let _ = self.engine.end_utterance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::engine::MockDecoderEngine;

    #[test]
    fn test_session_opens_and_closes_one_utterance() {
        let mut engine = MockDecoderEngine::new("test-model").with_hypothesis("hi there", 0.7);

        let mut session = DecodingSession::open(&mut engine).unwrap();
        session.feed(&[1i16; 480]).unwrap();
        session.feed(&[2i16; 480]).unwrap();
        assert_eq!(session.frames_fed(), 2);

        let hyp = session.close().unwrap().unwrap();
        assert_eq!(hyp.text, "hi there");

        assert_eq!(engine.utterances_started(), 1);
        assert_eq!(engine.utterances_ended(), 1);
        assert!(!engine.in_utterance());
    }

    #[test]
    fn test_open_failure_produces_no_session() {
        let mut engine = MockDecoderEngine::new("test-model").with_begin_failure();
        assert!(DecodingSession::open(&mut engine).is_err());
        assert_eq!(engine.utterances_started(), 0);
        assert!(!engine.in_utterance());
    }

    #[test]
    fn test_drop_ends_abandoned_utterance() {
        let mut engine = MockDecoderEngine::new("test-model");

        {
            let mut session = DecodingSession::open(&mut engine).unwrap();
            session.feed(&[0i16; 480]).unwrap();
            // Dropped without close
        }

        assert!(!engine.in_utterance());
        assert_eq!(engine.utterances_ended(), 1);
    }

    #[test]
    fn test_close_normalizes_empty_hypothesis_to_none() {
        let mut engine = MockDecoderEngine::new("test-model").with_hypothesis("", 0.0);
        let session = DecodingSession::open(&mut engine).unwrap();
        assert_eq!(session.close().unwrap(), None);

        let mut engine = MockDecoderEngine::new("test-model").with_hypothesis("   \t", 0.5);
        let session = DecodingSession::open(&mut engine).unwrap();
        assert_eq!(session.close().unwrap(), None);
    }

    #[test]
    fn test_close_passes_through_missing_hypothesis() {
        let mut engine = MockDecoderEngine::new("test-model").with_no_hypothesis();
        let session = DecodingSession::open(&mut engine).unwrap();
        assert_eq!(session.close().unwrap(), None);
    }

    #[test]
    fn test_feed_error_propagates() {
        let mut engine = MockDecoderEngine::new("test-model").with_feed_failure();
        let mut session = DecodingSession::open(&mut engine).unwrap();
        assert!(session.feed(&[0i16; 480]).is_err());
        assert_eq!(session.frames_fed(), 0);
        drop(session);
        assert!(!engine.in_utterance());
    }

    #[test]
    fn test_close_error_propagates() {
        let mut engine = MockDecoderEngine::new("test-model").with_end_failure();
        let session = DecodingSession::open(&mut engine).unwrap();
        assert!(session.close().is_err());
        assert!(!engine.in_utterance());
    }

    #[test]
    fn test_sequential_sessions_on_one_engine() {
        let mut engine = MockDecoderEngine::new("test-model").with_hypothesis("again", 0.9);

        for _ in 0..3 {
            let mut session = DecodingSession::open(&mut engine).unwrap();
            session.feed(&[0i16; 480]).unwrap();
            assert!(session.close().unwrap().is_some());
        }

        assert_eq!(engine.utterances_started(), 3);
        assert_eq!(engine.utterances_ended(), 3);
    }
}
