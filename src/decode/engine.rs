use crate::error::{HarkError, Result};
use serde::Serialize;

/// Best-guess transcription for one completed utterance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hypothesis {
    /// Transcribed text.
    pub text: String,
    /// Confidence in the transcription (0.0 to 1.0).
    pub confidence: f32,
}

/// Trait for utterance-scoped acoustic decoding engines.
///
/// This trait allows swapping implementations (real backend vs mock).
///
/// An engine decodes one utterance at a time: exactly one `begin_utterance`
/// must precede any `feed`, and exactly one `end_utterance` must follow the
/// last `feed`. Callers should not drive this protocol by hand; use
/// [`crate::decode::DecodingSession`], which enforces it by construction.
pub trait DecoderEngine: Send {
    /// Begin a new utterance-scoped decoding pass.
    fn begin_utterance(&mut self) -> Result<()>;

    /// Feed one frame of in-speech audio, in capture order.
    fn feed(&mut self, frame: &[i16]) -> Result<()>;

    /// End the utterance and return the best hypothesis, if any.
    fn end_utterance(&mut self) -> Result<Option<Hypothesis>>;

    /// Check if the engine is ready to decode
    fn is_ready(&self) -> bool;

    /// Get the name of the loaded model
    fn name(&self) -> &str;
}

/// Mock decoder engine for testing.
///
/// Tracks the utterance protocol strictly: out-of-order calls are errors, so
/// controller bugs surface as decoder errors in tests. Every fed frame is
/// recorded in order for inspection.
#[derive(Debug, Clone)]
pub struct MockDecoderEngine {
    model_name: String,
    hypothesis: Option<Hypothesis>,
    should_fail_begin: bool,
    should_fail_feed: bool,
    should_fail_end: bool,
    ready: bool,
    in_utterance: bool,
    utterances_started: usize,
    utterances_ended: usize,
    fed: Vec<Vec<i16>>,
}

impl MockDecoderEngine {
    /// Create a new mock engine with default settings
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            hypothesis: Some(Hypothesis {
                text: "mock hypothesis".to_string(),
                confidence: 0.9,
            }),
            should_fail_begin: false,
            should_fail_feed: false,
            should_fail_end: false,
            ready: true,
            in_utterance: false,
            utterances_started: 0,
            utterances_ended: 0,
            fed: Vec::new(),
        }
    }

    /// Configure the hypothesis returned at end of utterance
    pub fn with_hypothesis(mut self, text: &str, confidence: f32) -> Self {
        self.hypothesis = Some(Hypothesis {
            text: text.to_string(),
            confidence,
        });
        self
    }

    /// Configure the engine to produce no hypothesis at all
    pub fn with_no_hypothesis(mut self) -> Self {
        self.hypothesis = None;
        self
    }

    /// Configure the engine to fail on begin_utterance
    pub fn with_begin_failure(mut self) -> Self {
        self.should_fail_begin = true;
        self
    }

    /// Configure the engine to fail on feed
    pub fn with_feed_failure(mut self) -> Self {
        self.should_fail_feed = true;
        self
    }

    /// Configure the engine to fail on end_utterance
    pub fn with_end_failure(mut self) -> Self {
        self.should_fail_end = true;
        self
    }

    /// Configure the engine to report not ready
    pub fn with_not_ready(mut self) -> Self {
        self.ready = false;
        self
    }

    /// Whether an utterance is currently open
    pub fn in_utterance(&self) -> bool {
        self.in_utterance
    }

    /// Number of utterances begun
    pub fn utterances_started(&self) -> usize {
        self.utterances_started
    }

    /// Number of utterances ended
    pub fn utterances_ended(&self) -> usize {
        self.utterances_ended
    }

    /// All frames fed so far, in order, across all utterances
    pub fn fed_frames(&self) -> &[Vec<i16>] {
        &self.fed
    }
}

impl DecoderEngine for MockDecoderEngine {
    fn begin_utterance(&mut self) -> Result<()> {
        if self.should_fail_begin {
            return Err(HarkError::Decode {
                message: "mock begin failure".to_string(),
            });
        }
        if self.in_utterance {
            return Err(HarkError::Decode {
                message: "begin_utterance while an utterance is open".to_string(),
            });
        }
        self.in_utterance = true;
        self.utterances_started += 1;
        Ok(())
    }

    fn feed(&mut self, frame: &[i16]) -> Result<()> {
        if !self.in_utterance {
            return Err(HarkError::Decode {
                message: "feed outside an open utterance".to_string(),
            });
        }
        if self.should_fail_feed {
            return Err(HarkError::Decode {
                message: "mock feed failure".to_string(),
            });
        }
        self.fed.push(frame.to_vec());
        Ok(())
    }

    fn end_utterance(&mut self) -> Result<Option<Hypothesis>> {
        if !self.in_utterance {
            return Err(HarkError::Decode {
                message: "end_utterance without an open utterance".to_string(),
            });
        }
        self.in_utterance = false;
        self.utterances_ended += 1;
        if self.should_fail_end {
            return Err(HarkError::Decode {
                message: "mock end failure".to_string(),
            });
        }
        Ok(self.hypothesis.clone())
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}
