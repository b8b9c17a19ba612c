//! End-to-end recognition flow through the public API.
//!
//! Drives the recognizer with WAV data built in memory, so the whole path
//! from frame source through endpoint detection to the decoding session is
//! exercised the way library consumers use it.

use hark::audio::wav::WavFrameSource;
use hark::endpoint::EndpointConfig;
use hark::{
    Config, MockDecoderEngine, ModelConfig, RecognitionOutcome, Recognizer, WhisperEngine,
};
use std::io::Cursor;
use std::path::PathBuf;

const SAMPLE_RATE: u32 = 16000;

/// Build an in-memory 16kHz mono WAV from sections of (amplitude, seconds).
fn wav_clip(sections: &[(i16, f32)]) -> WavFrameSource {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &(amplitude, seconds) in sections {
            let count = (SAMPLE_RATE as f32 * seconds) as usize;
            for i in 0..count {
                // Alternating-sign signal so RMS tracks the amplitude
                let sample = if i % 2 == 0 { amplitude } else { -amplitude };
                writer.write_sample(sample).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    WavFrameSource::from_reader(Box::new(Cursor::new(cursor.into_inner()))).unwrap()
}

fn recognizer_for(engine: MockDecoderEngine) -> Recognizer<MockDecoderEngine> {
    let endpoint = EndpointConfig {
        trailing_silence_ms: 300,
        ..EndpointConfig::default()
    };
    Recognizer::new(engine, endpoint).unwrap()
}

#[test]
fn silent_clip_yields_no_speech() {
    let engine = MockDecoderEngine::new("itest");
    let mut recognizer = recognizer_for(engine);
    let mut source = wav_clip(&[(0, 2.0)]);

    let outcome = recognizer.recognize(&mut source);

    assert_eq!(outcome, RecognitionOutcome::NoSpeechDetected);
    assert_eq!(outcome.to_string(), "No speech detected");
    assert_eq!(recognizer.engine().utterances_started(), 0);
}

#[test]
fn spoken_clip_is_transcribed() {
    let engine = MockDecoderEngine::new("itest").with_hypothesis("hello world", 0.95);
    let mut recognizer = recognizer_for(engine);
    let mut source = wav_clip(&[(0, 0.5), (3000, 1.0), (0, 1.0)]);

    let outcome = recognizer.recognize(&mut source);

    assert_eq!(outcome.to_string(), "hello world");
    assert_eq!(recognizer.engine().utterances_started(), 1);
    assert_eq!(recognizer.engine().utterances_ended(), 1);

    // Roughly one second of speech plus the trailing silence budget was fed
    let fed: usize = recognizer.engine().fed_frames().iter().map(Vec::len).sum();
    assert!(fed >= (SAMPLE_RATE as usize), "fed {} samples", fed);
    assert!(fed < (SAMPLE_RATE as usize * 3 / 2), "fed {} samples", fed);
}

#[test]
fn one_utterance_per_call_drains_a_clip_across_calls() {
    let engine = MockDecoderEngine::new("itest").with_hypothesis("segment", 0.9);
    let mut recognizer = recognizer_for(engine);
    // Two utterances separated by a pause longer than the trailing budget
    let mut source = wav_clip(&[(3000, 0.6), (0, 1.0), (3000, 0.6), (0, 1.0)]);

    let first = recognizer.recognize(&mut source);
    assert!(first.is_transcription());
    assert_eq!(recognizer.engine().utterances_started(), 1);

    let second = recognizer.recognize(&mut source);
    assert!(second.is_transcription());
    assert_eq!(recognizer.engine().utterances_started(), 2);

    // Stream is exhausted now
    let third = recognizer.recognize(&mut source);
    assert_eq!(third, RecognitionOutcome::NoSpeechDetected);
}

#[test]
fn stream_end_mid_utterance_still_produces_the_partial_hypothesis() {
    let engine = MockDecoderEngine::new("itest").with_hypothesis("cut off", 0.4);
    let mut recognizer = recognizer_for(engine);
    // Clip ends while speech is still running (short tail frame at the end)
    let mut source = wav_clip(&[(0, 0.3), (3000, 0.71)]);

    let outcome = recognizer.recognize(&mut source);

    assert_eq!(outcome.to_string(), "cut off");
    assert_eq!(recognizer.engine().utterances_ended(), 1);
}

#[test]
fn engine_construction_fails_cleanly_on_missing_model() {
    // No half-usable handle, no device opened: construction errors out
    // before any audio resource exists.
    let model = ModelConfig {
        acoustic_model: PathBuf::from("/nonexistent/acoustic.bin"),
        ..ModelConfig::default()
    };

    assert!(WhisperEngine::new(model).is_err());
}

#[test]
fn config_defaults_build_a_working_endpoint_detector() {
    let config = Config::default();
    let engine = MockDecoderEngine::new("itest");
    let recognizer = Recognizer::new(engine, config.endpoint_config()).unwrap();
    assert_eq!(recognizer.frame_size(), 480);
}
