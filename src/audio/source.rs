use crate::error::{HarkError, Result};
use std::collections::VecDeque;

/// Trait for frame-oriented audio sources.
///
/// This trait allows swapping implementations (real audio device vs mock).
/// Sources deliver mono 16-bit PCM in capture order, one frame per call.
pub trait FrameSource: Send {
    /// Open the source for reading.
    ///
    /// # Returns
    /// Ok(()) if the source opened successfully, or an error
    fn open(&mut self) -> Result<()>;

    /// Blocking read of the next frame of `frame_size` samples.
    ///
    /// # Returns
    /// - `Ok(Some(frame))`: the next frame in capture order. A frame shorter
    ///   than `frame_size` may be returned once at the stream tail.
    /// - `Ok(None)`: the stream ended cleanly.
    /// - `Err(_)`: the device reported an error.
    fn read_frame(&mut self, frame_size: usize) -> Result<Option<Vec<i16>>>;

    /// Close the source. Must be safe to call after a failed read.
    fn close(&mut self) -> Result<()>;
}

/// Scripted frame source for testing.
///
/// Plays back a fixed sequence of frames, then signals end-of-stream.
/// Failures can be injected at open, close, or a specific read index.
#[derive(Debug, Clone)]
pub struct ScriptedFrameSource {
    frames: VecDeque<Vec<i16>>,
    should_fail_open: bool,
    should_fail_close: bool,
    fail_read_at: Option<usize>,
    error_message: String,
    is_open: bool,
    opens: usize,
    closes: usize,
    reads: usize,
}

impl ScriptedFrameSource {
    /// Create a source with no frames (immediate end-of-stream).
    pub fn new() -> Self {
        Self {
            frames: VecDeque::new(),
            should_fail_open: false,
            should_fail_close: false,
            fail_read_at: None,
            error_message: "scripted audio error".to_string(),
            is_open: false,
            opens: 0,
            closes: 0,
            reads: 0,
        }
    }

    /// Script the frames the source will yield, in order.
    pub fn with_frames(mut self, frames: Vec<Vec<i16>>) -> Self {
        self.frames = frames.into();
        self
    }

    /// Configure the source to fail on open
    pub fn with_open_failure(mut self) -> Self {
        self.should_fail_open = true;
        self
    }

    /// Configure the source to fail on close
    pub fn with_close_failure(mut self) -> Self {
        self.should_fail_close = true;
        self
    }

    /// Configure the source to fail on the n-th read (0-based)
    pub fn with_read_failure_at(mut self, read_index: usize) -> Self {
        self.fail_read_at = Some(read_index);
        self
    }

    /// Configure the error message for failures
    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }

    /// Whether the source is currently open
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Number of times `open` succeeded
    pub fn opens(&self) -> usize {
        self.opens
    }

    /// Number of times `close` succeeded
    pub fn closes(&self) -> usize {
        self.closes
    }

    /// Number of `read_frame` calls made
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl Default for ScriptedFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for ScriptedFrameSource {
    fn open(&mut self) -> Result<()> {
        if self.should_fail_open {
            Err(HarkError::AudioCapture {
                message: self.error_message.clone(),
            })
        } else {
            self.is_open = true;
            self.opens += 1;
            Ok(())
        }
    }

    fn read_frame(&mut self, _frame_size: usize) -> Result<Option<Vec<i16>>> {
        let index = self.reads;
        self.reads += 1;

        if self.fail_read_at == Some(index) {
            return Err(HarkError::AudioCapture {
                message: self.error_message.clone(),
            });
        }

        Ok(self.frames.pop_front())
    }

    fn close(&mut self) -> Result<()> {
        if self.should_fail_close {
            Err(HarkError::AudioCapture {
                message: self.error_message.clone(),
            })
        } else {
            self.is_open = false;
            self.closes += 1;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_source_yields_frames_in_order() {
        let mut source = ScriptedFrameSource::new()
            .with_frames(vec![vec![1i16; 480], vec![2i16; 480], vec![3i16; 480]]);

        source.open().unwrap();
        assert_eq!(source.read_frame(480).unwrap(), Some(vec![1i16; 480]));
        assert_eq!(source.read_frame(480).unwrap(), Some(vec![2i16; 480]));
        assert_eq!(source.read_frame(480).unwrap(), Some(vec![3i16; 480]));
        assert_eq!(source.read_frame(480).unwrap(), None);
        source.close().unwrap();
    }

    #[test]
    fn test_scripted_source_empty_is_immediate_end() {
        let mut source = ScriptedFrameSource::new();
        source.open().unwrap();
        assert_eq!(source.read_frame(480).unwrap(), None);
    }

    #[test]
    fn test_scripted_source_open_failure() {
        let mut source = ScriptedFrameSource::new().with_open_failure();

        let result = source.open();
        assert!(result.is_err());
        assert!(!source.is_open());
        match result {
            Err(HarkError::AudioCapture { message }) => {
                assert_eq!(message, "scripted audio error");
            }
            _ => panic!("Expected AudioCapture error"),
        }
    }

    #[test]
    fn test_scripted_source_read_failure_at_index() {
        let mut source = ScriptedFrameSource::new()
            .with_frames(vec![vec![0i16; 480]; 5])
            .with_read_failure_at(2)
            .with_error_message("read stalled");

        source.open().unwrap();
        assert!(source.read_frame(480).unwrap().is_some());
        assert!(source.read_frame(480).unwrap().is_some());

        match source.read_frame(480) {
            Err(HarkError::AudioCapture { message }) => {
                assert_eq!(message, "read stalled");
            }
            other => panic!("Expected AudioCapture error, got {:?}", other.is_ok()),
        }
    }

    #[test]
    fn test_scripted_source_close_failure() {
        let mut source = ScriptedFrameSource::new().with_close_failure();

        source.open().unwrap();
        assert!(source.close().is_err());
        // State stays open since close failed
        assert!(source.is_open());
    }

    #[test]
    fn test_scripted_source_counts_lifecycle_calls() {
        let mut source = ScriptedFrameSource::new().with_frames(vec![vec![0i16; 480]]);

        source.open().unwrap();
        source.read_frame(480).unwrap();
        source.read_frame(480).unwrap();
        source.close().unwrap();

        assert_eq!(source.opens(), 1);
        assert_eq!(source.reads(), 2);
        assert_eq!(source.closes(), 1);
    }

    #[test]
    fn test_scripted_source_short_tail_frame() {
        let mut source =
            ScriptedFrameSource::new().with_frames(vec![vec![0i16; 480], vec![0i16; 100]]);

        source.open().unwrap();
        assert_eq!(source.read_frame(480).unwrap().unwrap().len(), 480);
        assert_eq!(source.read_frame(480).unwrap().unwrap().len(), 100);
        assert_eq!(source.read_frame(480).unwrap(), None);
    }

    #[test]
    fn test_frame_source_trait_is_object_safe() {
        let mut source: Box<dyn FrameSource> =
            Box::new(ScriptedFrameSource::new().with_frames(vec![vec![7i16; 4]]));

        source.open().unwrap();
        assert_eq!(source.read_frame(4).unwrap(), Some(vec![7i16; 4]));
        assert_eq!(source.read_frame(4).unwrap(), None);
        source.close().unwrap();
    }
}
