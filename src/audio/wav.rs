//! WAV file frame source for pipe mode.

use crate::audio::source::FrameSource;
use crate::defaults::SAMPLE_RATE;
use crate::error::{HarkError, Result};
use std::io::Read;
use std::path::Path;

/// Frame source that reads from WAV file data.
/// Supports arbitrary sample rates and channels, resampling to 16kHz mono.
///
/// Frames are served in capture order; a final short frame is emitted for the
/// stream tail, then end-of-stream.
pub struct WavFrameSource {
    samples: Vec<i16>,
    position: usize,
}

impl WavFrameSource {
    /// Create from any reader (for testing/flexibility).
    pub fn from_reader(reader: Box<dyn Read + Send>) -> Result<Self> {
        let mut wav_reader =
            hound::WavReader::new(reader).map_err(|e| HarkError::AudioCapture {
                message: format!("Failed to parse WAV file: {}", e),
            })?;

        let spec = wav_reader.spec();
        let source_rate = spec.sample_rate;
        let source_channels = spec.channels;

        // Read all samples from the WAV file
        let raw_samples: Vec<i16> = wav_reader
            .samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| HarkError::AudioCapture {
                message: format!("Failed to read WAV samples: {}", e),
            })?;

        // Convert to mono if stereo
        let mono_samples = if source_channels == 2 {
            raw_samples
                .chunks_exact(2)
                .map(|chunk| {
                    let left = chunk[0] as i32;
                    let right = chunk[1] as i32;
                    ((left + right) / 2) as i16
                })
                .collect()
        } else {
            raw_samples
        };

        // Resample to 16kHz if needed
        let samples = if source_rate != SAMPLE_RATE {
            resample(&mono_samples, source_rate, SAMPLE_RATE)
        } else {
            mono_samples
        };

        Ok(Self {
            samples,
            position: 0,
        })
    }

    /// Create from a WAV file on disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| HarkError::AudioCapture {
            message: format!("Failed to open WAV file {}: {}", path.display(), e),
        })?;
        Self::from_reader(Box::new(std::io::BufReader::new(file)))
    }

    /// Create from stdin.
    pub fn from_stdin() -> Result<Self> {
        use std::io::Cursor;

        // Read all data from stdin into memory first (StdinLock is not Send)
        let mut buffer = Vec::new();
        std::io::stdin()
            .lock()
            .read_to_end(&mut buffer)
            .map_err(|e| HarkError::AudioCapture {
                message: format!("Failed to read from stdin: {}", e),
            })?;

        Self::from_reader(Box::new(Cursor::new(buffer)))
    }

    /// Consume the source and return all samples as a single buffer.
    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }
}

impl FrameSource for WavFrameSource {
    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_frame(&mut self, frame_size: usize) -> Result<Option<Vec<i16>>> {
        if self.position >= self.samples.len() {
            return Ok(None);
        }

        let end = std::cmp::min(self.position + frame_size, self.samples.len());
        let frame = self.samples[self.position..end].to_vec();
        self.position = end;

        Ok(Some(frame))
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Simple linear interpolation resampling.
pub(crate) fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[source_idx]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as i16
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn wav_bytes(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &sample in samples {
                writer.write_sample(sample).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_reads_mono_16khz_in_frames() {
        let samples: Vec<i16> = (0..1000).map(|i| i as i16).collect();
        let bytes = wav_bytes(16000, 1, &samples);

        let mut source = WavFrameSource::from_reader(Box::new(Cursor::new(bytes))).unwrap();
        source.open().unwrap();

        let first = source.read_frame(480).unwrap().unwrap();
        assert_eq!(first.len(), 480);
        assert_eq!(first[0], 0);
        assert_eq!(first[479], 479);

        let second = source.read_frame(480).unwrap().unwrap();
        assert_eq!(second[0], 480);
    }

    #[test]
    fn test_short_tail_frame_then_end() {
        let samples = vec![100i16; 500];
        let bytes = wav_bytes(16000, 1, &samples);

        let mut source = WavFrameSource::from_reader(Box::new(Cursor::new(bytes))).unwrap();
        source.open().unwrap();

        assert_eq!(source.read_frame(480).unwrap().unwrap().len(), 480);
        assert_eq!(source.read_frame(480).unwrap().unwrap().len(), 20);
        assert_eq!(source.read_frame(480).unwrap(), None);
        assert_eq!(source.read_frame(480).unwrap(), None);
    }

    #[test]
    fn test_stereo_is_mixed_to_mono() {
        // Interleaved L/R pairs: (100, 200) → 150
        let samples = vec![100i16, 200, 100, 200, 100, 200, 100, 200];
        let bytes = wav_bytes(16000, 2, &samples);

        let mut source = WavFrameSource::from_reader(Box::new(Cursor::new(bytes))).unwrap();
        let frame = source.read_frame(4).unwrap().unwrap();
        assert_eq!(frame, vec![150i16; 4]);
    }

    #[test]
    fn test_resamples_to_16khz() {
        // 1 second at 8kHz becomes ~2 seconds' worth of 16kHz samples
        let samples = vec![1000i16; 8000];
        let bytes = wav_bytes(8000, 1, &samples);

        let source = WavFrameSource::from_reader(Box::new(Cursor::new(bytes))).unwrap();
        let all = source.into_samples();
        assert!((all.len() as i64 - 16000).abs() < 10);
    }

    #[test]
    fn test_invalid_wav_data_is_an_error() {
        let result = WavFrameSource::from_reader(Box::new(Cursor::new(vec![0u8; 16])));
        assert!(matches!(result, Err(HarkError::AudioCapture { .. })));
    }

    #[test]
    fn test_resample_identity() {
        let samples = vec![1i16, 2, 3, 4];
        assert_eq!(resample(&samples, 16000, 16000), samples);
    }

    #[test]
    fn test_resample_downsamples_by_half() {
        let samples: Vec<i16> = (0..100).collect();
        let out = resample(&samples, 32000, 16000);
        assert_eq!(out.len(), 50);
        assert_eq!(out[0], 0);
        assert_eq!(out[1], 2);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = WavFrameSource::from_path(Path::new("/nonexistent/clip.wav"));
        assert!(matches!(result, Err(HarkError::AudioCapture { .. })));
    }
}
