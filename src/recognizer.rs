//! Recognition session management: the utterance lifecycle state machine.
//!
//! [`Recognizer::recognize`] runs exactly one recognition pass: pull frames
//! from a [`FrameSource`], classify each through the [`EndpointDetector`],
//! open a [`DecodingSession`] when speech starts, feed it in-speech frames in
//! capture order, and close it when speech ends. Every exit path closes the
//! source and never leaves the engine mid-utterance.

use crate::audio::source::FrameSource;
use crate::decode::engine::{DecoderEngine, Hypothesis};
use crate::decode::session::DecodingSession;
use crate::endpoint::{EndpointConfig, EndpointDetector};
use crate::error::Result;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation signal, polled once per frame.
///
/// Clone the token, hand it to the recognizing thread, and call `cancel()`
/// from anywhere to stop the blocking read-until-speech loop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Takes effect at the next frame boundary.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// The result of one recognition pass.
///
/// An owned value, produced exactly once per `recognize` call and consumed by
/// the caller; the `Display` form yields the stable boundary strings.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionOutcome {
    /// A non-empty transcription of the utterance.
    Transcription(Hypothesis),
    /// The recognizer's engine is not ready to decode.
    NotInitialized,
    /// The stream ended, or the utterance closed, without a usable hypothesis.
    NoSpeechDetected,
    /// The caller cancelled before any speech was transcribed.
    Cancelled,
    /// The audio source failed before any speech was observed.
    DeviceError(String),
    /// The decoding engine failed to open, feed, or close a session.
    DecoderError(String),
}

impl RecognitionOutcome {
    /// The transcribed text, if this outcome carries one.
    pub fn into_text(self) -> Option<String> {
        match self {
            RecognitionOutcome::Transcription(hyp) => Some(hyp.text),
            _ => None,
        }
    }

    /// Borrow the hypothesis, if this outcome carries one.
    pub fn hypothesis(&self) -> Option<&Hypothesis> {
        match self {
            RecognitionOutcome::Transcription(hyp) => Some(hyp),
            _ => None,
        }
    }

    pub fn is_transcription(&self) -> bool {
        matches!(self, RecognitionOutcome::Transcription(_))
    }
}

impl fmt::Display for RecognitionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecognitionOutcome::Transcription(hyp) => write!(f, "{}", hyp.text),
            RecognitionOutcome::NotInitialized => write!(f, "Recognizer not initialized"),
            RecognitionOutcome::NoSpeechDetected => write!(f, "No speech detected"),
            RecognitionOutcome::Cancelled => write!(f, "Recognition cancelled"),
            RecognitionOutcome::DeviceError(message) => write!(f, "{}", message),
            RecognitionOutcome::DecoderError(message) => write!(f, "{}", message),
        }
    }
}

/// Long-lived recognition handle.
///
/// Owns the decoding engine and the endpoint detector; reused across many
/// `recognize` calls. The frame source is owned per call: the caller passes
/// one in, `recognize` opens it on entry and closes it on every exit path.
///
/// Not internally synchronized: one recognition pass occupies the caller's
/// thread, and concurrent calls require external serialization.
pub struct Recognizer<E: DecoderEngine> {
    engine: E,
    endpointer: EndpointDetector,
    max_idle_frames: Option<u64>,
}

impl<E: DecoderEngine> Recognizer<E> {
    /// Create a recognizer from an engine and endpoint configuration.
    ///
    /// # Errors
    /// Fails if the endpoint configuration is invalid. Construction either
    /// fully succeeds or returns nothing usable; anything acquired earlier
    /// is released in reverse order by drop.
    pub fn new(engine: E, endpoint: EndpointConfig) -> Result<Self> {
        let endpointer = EndpointDetector::new(endpoint)?;
        Ok(Self {
            engine,
            endpointer,
            max_idle_frames: None,
        })
    }

    /// Bound the wait for speech to start.
    ///
    /// `None` waits indefinitely (plain blocking capture). With a bound, a
    /// pass that sees only leading silence for this long returns
    /// [`RecognitionOutcome::NoSpeechDetected`] instead of blocking forever.
    pub fn with_max_leading_silence_ms(mut self, ms: Option<u64>) -> Self {
        self.max_idle_frames = ms.map(|ms| {
            let frame_ms = self.endpointer.config().frame_ms as u64;
            ms.div_ceil(frame_ms).max(1)
        });
        self
    }

    /// Number of samples `recognize` reads per frame, dictated by the
    /// endpoint detector.
    pub fn frame_size(&self) -> usize {
        self.endpointer.frame_size()
    }

    /// Borrow the decoding engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Run one complete recognition pass: capture until one utterance has
    /// been detected and decoded, or the stream ends, or something fails.
    ///
    /// Processes exactly one utterance; later speech segments in the raw
    /// stream belong to later calls.
    pub fn recognize(&mut self, source: &mut dyn FrameSource) -> RecognitionOutcome {
        self.recognize_with_cancel(source, &CancelToken::new())
    }

    /// Like [`Recognizer::recognize`], but polls `cancel` once per frame.
    ///
    /// Cancelling mid-utterance still closes the session; a partial
    /// hypothesis, if the engine produced one, is returned.
    pub fn recognize_with_cancel(
        &mut self,
        source: &mut dyn FrameSource,
        cancel: &CancelToken,
    ) -> RecognitionOutcome {
        if !self.engine.is_ready() {
            // Never touch the source for a handle that can't decode.
            return RecognitionOutcome::NotInitialized;
        }

        // Rearm for this pass; the handle is reused across calls.
        self.endpointer.reset();

        if let Err(e) = source.open() {
            return RecognitionOutcome::DeviceError(format!("Failed to open stream: {}", e));
        }

        let outcome = run_utterance(
            &mut self.engine,
            &mut self.endpointer,
            self.max_idle_frames,
            source,
            cancel,
        );

        // Teardown runs on every path. A close failure cannot un-produce
        // the outcome, so it is not surfaced.
        let _ = source.close();

        outcome
    }
}

/// The per-call state machine: Idle → InUtterance → Closed.
fn run_utterance<E: DecoderEngine>(
    engine: &mut E,
    endpointer: &mut EndpointDetector,
    max_idle_frames: Option<u64>,
    source: &mut dyn FrameSource,
    cancel: &CancelToken,
) -> RecognitionOutcome {
    let frame_size = endpointer.frame_size();

    // Idle: read until the endpoint detector opens an utterance.
    let mut idle_frames: u64 = 0;
    let first_frame: Vec<i16> = loop {
        if cancel.is_cancelled() {
            return RecognitionOutcome::Cancelled;
        }

        let frame = match source.read_frame(frame_size) {
            Err(e) => {
                return RecognitionOutcome::DeviceError(format!(
                    "Failed to read from stream: {}",
                    e
                ));
            }
            Ok(None) => return RecognitionOutcome::NoSpeechDetected,
            Ok(Some(frame)) if frame.len() != frame_size => {
                // Short read at the stream tail: terminal, never classified.
                return RecognitionOutcome::NoSpeechDetected;
            }
            Ok(Some(frame)) => frame,
        };

        if endpointer.classify(&frame).is_some() {
            break frame;
        }

        idle_frames += 1;
        if let Some(max) = max_idle_frames
            && idle_frames >= max
        {
            // Bounded wait: give up on a stream that never produces speech.
            return RecognitionOutcome::NoSpeechDetected;
        }
    };

    // InUtterance: one session for the whole utterance.
    let mut session = match DecodingSession::open(engine) {
        Ok(session) => session,
        Err(e) => {
            return RecognitionOutcome::DecoderError(format!("Failed to start utterance: {}", e));
        }
    };

    if let Err(e) = session.feed(&first_frame) {
        // Fail fast on feed errors; dropping the session ends the utterance.
        return RecognitionOutcome::DecoderError(format!("Failed to process frame: {}", e));
    }
    if !endpointer.in_speech() {
        return close_session(session, RecognitionOutcome::NoSpeechDetected);
    }

    loop {
        if cancel.is_cancelled() {
            return close_session(session, RecognitionOutcome::Cancelled);
        }

        let frame = match source.read_frame(frame_size) {
            // Device failure or stream end mid-utterance: the failed or
            // partial frame is never fed, but the frames already fed still
            // produce an orderly close.
            Err(_) => return close_session(session, RecognitionOutcome::NoSpeechDetected),
            Ok(None) => return close_session(session, RecognitionOutcome::NoSpeechDetected),
            Ok(Some(frame)) if frame.len() != frame_size => {
                return close_session(session, RecognitionOutcome::NoSpeechDetected);
            }
            Ok(Some(frame)) => frame,
        };

        // Inside an utterance every frame belongs to it until the detector
        // closes, so classify returns the frame back here.
        if let Some(speech) = endpointer.classify(&frame) {
            if let Err(e) = session.feed(speech) {
                return RecognitionOutcome::DecoderError(format!(
                    "Failed to process frame: {}",
                    e
                ));
            }
            if !endpointer.in_speech() {
                return close_session(session, RecognitionOutcome::NoSpeechDetected);
            }
        }
    }
}

/// Close the session; a usable hypothesis wins, otherwise `fallback`.
fn close_session(session: DecodingSession<'_>, fallback: RecognitionOutcome) -> RecognitionOutcome {
    match session.close() {
        Ok(Some(hypothesis)) => RecognitionOutcome::Transcription(hypothesis),
        Ok(None) => fallback,
        Err(e) => RecognitionOutcome::DecoderError(format!("Failed to end utterance: {}", e)),
    }
}
