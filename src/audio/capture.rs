//! Real audio capture using CPAL (Cross-Platform Audio Library).

use crate::audio::source::FrameSource;
use crate::defaults;
use crate::error::{HarkError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use std::time::Duration;

/// Run a closure with stderr temporarily redirected to /dev/null.
///
/// This suppresses noisy ALSA/JACK/PipeWire messages that CPAL triggers
/// when probing audio backends. The messages are harmless but confusing to users.
///
/// # Safety
/// Uses `libc::dup`/`libc::dup2` to save and restore file descriptor 2 (stderr).
/// Safe as long as no other thread is concurrently manipulating fd 2.
fn with_suppressed_stderr<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    unsafe {
        let saved_fd = libc::dup(2);
        let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY);
        if saved_fd >= 0 && devnull >= 0 {
            libc::dup2(devnull, 2);
            libc::close(devnull);
        }

        let result = f();

        if saved_fd >= 0 {
            libc::dup2(saved_fd, 2);
            libc::close(saved_fd);
        }

        result
    }
}

/// Suppress noisy JACK/ALSA error messages that occur during audio backend probing.
/// These are harmless but confusing to users.
///
/// # Safety
/// This modifies environment variables which is safe when called before spawning threads.
pub fn suppress_audio_warnings() {
    // SAFETY: Called at startup before any threads are spawned
    unsafe {
        std::env::set_var("JACK_NO_START_SERVER", "1");
        std::env::set_var("JACK_NO_AUDIO_RESERVATION", "1");
        std::env::set_var("PIPEWIRE_DEBUG", "0");
        std::env::set_var("ALSA_DEBUG", "0");
        std::env::set_var("PW_LOG", "0");
    }
}

/// Preferred device names for GNOME/PipeWire environments.
const PREFERRED_DEVICES: &[&str] = &["pipewire", "pulse", "PulseAudio"];

/// Device name patterns to filter out (not useful for voice input).
const FILTERED_PATTERNS: &[&str] = &[
    "surround",
    "front:",
    "rear:",
    "center:",
    "side:",
    "Digital Output",
    "HDMI",
    "S/PDIF",
];

/// Check if a device name should be filtered out.
fn should_filter_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    FILTERED_PATTERNS
        .iter()
        .any(|pattern| lower.contains(&pattern.to_lowercase()))
}

/// Check if a device is a preferred device.
fn is_preferred_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    PREFERRED_DEVICES
        .iter()
        .any(|pref| lower.contains(&pref.to_lowercase()))
}

/// List all available audio input devices with filtering and recommendations.
///
/// # Returns
/// A vector of device names, with preferred devices marked with "\[recommended\]".
/// Filters out obviously unusable devices (surround channels, HDMI, etc.).
///
/// # Errors
/// Returns `HarkError::AudioCapture` if device enumeration fails.
pub fn list_devices() -> Result<Vec<String>> {
    let (host, devices) = with_suppressed_stderr(|| {
        let host = cpal::default_host();
        let devices = host.input_devices();
        (host, devices)
    });
    let _ = host; // keep host alive while iterating devices
    let devices = devices.map_err(|e| HarkError::AudioCapture {
        message: format!("Failed to enumerate input devices: {}", e),
    })?;

    let mut device_names = Vec::new();
    for device in devices {
        if let Ok(name) = device.name() {
            if should_filter_device(&name) {
                continue;
            }

            if is_preferred_device(&name) {
                device_names.push(format!("{} [recommended]", name));
            } else {
                device_names.push(name);
            }
        }
    }

    Ok(device_names)
}

/// Get the best default input device, preferring PipeWire/PulseAudio.
///
/// This ensures we respect the desktop's audio device selection.
///
/// # Errors
/// Returns `HarkError::AudioDeviceNotFound` if no input device is available.
fn get_best_default_device() -> Result<cpal::Device> {
    with_suppressed_stderr(|| {
        let host = cpal::default_host();

        if let Ok(devices) = host.input_devices() {
            for device in devices {
                if let Ok(name) = device.name()
                    && is_preferred_device(&name)
                {
                    return Ok(device);
                }
            }
        }

        host.default_input_device()
            .ok_or_else(|| HarkError::AudioDeviceNotFound {
                device: "default".to_string(),
            })
    })
}

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: The stream is owned by `CpalFrameSource` and only touched through
/// `&mut self`, so it never crosses thread boundaries concurrently.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// Microphone frame source implementation using CPAL.
///
/// Captures 16-bit PCM audio at 16kHz mono. Tries the preferred format first
/// (i16/16kHz/mono), then f32, then falls back to the device's default config
/// with software conversion (channel mixing + resampling).
///
/// The CPAL callback pushes sample chunks into a channel; `read_frame` drains
/// the channel and assembles frames of exactly the requested size, blocking
/// until enough samples arrive or the stream stalls.
pub struct CpalFrameSource {
    device: cpal::Device,
    stream: Option<SendableStream>,
    rx: Option<Receiver<Vec<i16>>>,
    pending: Vec<i16>,
    callback_count: std::sync::Arc<std::sync::atomic::AtomicU64>,
    sample_rate: u32,
}

impl CpalFrameSource {
    /// Create a new CPAL frame source.
    ///
    /// # Arguments
    /// * `device_name` - Optional device name. If None, uses the default input device.
    ///
    /// # Errors
    /// Returns errors if the device is not found or cannot be configured.
    pub fn new(device_name: Option<&str>) -> Result<Self> {
        let device = with_suppressed_stderr(|| {
            let host = cpal::default_host();

            if let Some(name) = device_name {
                let devices = host
                    .input_devices()
                    .map_err(|e| HarkError::AudioCapture {
                        message: format!("Failed to enumerate devices: {}", e),
                    })?;

                let mut found_device = None;
                for dev in devices {
                    if let Ok(dev_name) = dev.name()
                        && dev_name == name
                    {
                        found_device = Some(dev);
                        break;
                    }
                }

                found_device.ok_or_else(|| HarkError::AudioDeviceNotFound {
                    device: name.to_string(),
                })
            } else {
                get_best_default_device()
            }
        })?;

        Ok(Self {
            device,
            stream: None,
            rx: None,
            pending: Vec::new(),
            callback_count: std::sync::Arc::new(std::sync::atomic::AtomicU64::new(0)),
            sample_rate: defaults::SAMPLE_RATE,
        })
    }

    /// Build the audio stream with the configured format.
    ///
    /// Tries in order:
    /// 1. i16/16kHz/mono — preferred, zero-copy path
    /// 2. f32/16kHz/mono — for devices that only expose float formats
    /// 3. Device default config — native rate/channels with software conversion
    ///
    /// Step 3 handles PipeWire setups where the ALSA compatibility layer accepts
    /// non-native configs but never fires the data callback.
    fn build_stream(&self, tx: Sender<Vec<i16>>) -> Result<cpal::Stream> {
        use std::sync::atomic::Ordering;

        let preferred_config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let err_callback = |err| {
            eprintln!("Audio stream error: {}", err);
        };

        // Try i16/16kHz/mono — works with PipeWire/PulseAudio which convert transparently
        let chunk_tx = tx.clone();
        let counter = std::sync::Arc::clone(&self.callback_count);
        if let Ok(stream) = self.device.build_input_stream(
            &preferred_config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                counter.fetch_add(1, Ordering::Relaxed);
                let _ = chunk_tx.send(data.to_vec());
            },
            err_callback,
            None,
        ) {
            return Ok(stream);
        }

        // Try f32/16kHz/mono — for devices that only expose float formats
        let chunk_tx = tx.clone();
        let counter = std::sync::Arc::clone(&self.callback_count);
        if let Ok(stream) = self.device.build_input_stream(
            &preferred_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                counter.fetch_add(1, Ordering::Relaxed);
                let _ = chunk_tx.send(
                    data.iter()
                        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                        .collect(),
                );
            },
            err_callback,
            None,
        ) {
            return Ok(stream);
        }

        // Fallback: capture at device's native config, convert in software.
        self.build_stream_native(tx)
    }

    /// Build a stream using the device's default/native config, with software
    /// channel mixing (stereo→mono) and resampling (native rate→16kHz).
    fn build_stream_native(&self, tx: Sender<Vec<i16>>) -> Result<cpal::Stream> {
        use cpal::SampleFormat;
        use std::sync::atomic::Ordering;

        let default_config =
            self.device
                .default_input_config()
                .map_err(|e| HarkError::AudioCapture {
                    message: format!("Failed to query default input config: {}", e),
                })?;

        let native_rate = default_config.sample_rate().0;
        let native_channels = default_config.channels() as usize;
        let target_rate = self.sample_rate;

        let stream_config: cpal::StreamConfig = default_config.clone().into();

        eprintln!(
            "hark: using native audio format ({}ch/{}Hz/{:?}), converting in software",
            native_channels,
            native_rate,
            default_config.sample_format(),
        );

        let err_callback = |err| {
            eprintln!("Audio stream error: {}", err);
        };

        let counter = std::sync::Arc::clone(&self.callback_count);

        match default_config.sample_format() {
            SampleFormat::I16 => self
                .device
                .build_input_stream(
                    &stream_config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        counter.fetch_add(1, Ordering::Relaxed);
                        let converted = convert_to_mono_16khz_i16(
                            data,
                            native_channels,
                            native_rate,
                            target_rate,
                        );
                        let _ = tx.send(converted);
                    },
                    err_callback,
                    None,
                )
                .map_err(|e| HarkError::AudioCapture {
                    message: format!("Failed to build native i16 stream: {}", e),
                }),
            SampleFormat::F32 => self
                .device
                .build_input_stream(
                    &stream_config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        counter.fetch_add(1, Ordering::Relaxed);
                        let i16_data: Vec<i16> = data
                            .iter()
                            .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                            .collect();
                        let converted = convert_to_mono_16khz_i16(
                            &i16_data,
                            native_channels,
                            native_rate,
                            target_rate,
                        );
                        let _ = tx.send(converted);
                    },
                    err_callback,
                    None,
                )
                .map_err(|e| HarkError::AudioCapture {
                    message: format!("Failed to build native f32 stream: {}", e),
                }),
            fmt => Err(HarkError::AudioCapture {
                message: format!(
                    "Unsupported native sample format: {:?}. \
                     Try specifying a device with --device.",
                    fmt
                ),
            }),
        }
    }
}

/// Mix multi-channel audio to mono and resample to the target rate.
fn convert_to_mono_16khz_i16(
    samples: &[i16],
    channels: usize,
    source_rate: u32,
    target_rate: u32,
) -> Vec<i16> {
    // Mix to mono by averaging channels
    let mono: Vec<i16> = if channels == 1 {
        samples.to_vec()
    } else {
        samples
            .chunks_exact(channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect()
    };

    // Resample if needed
    if source_rate == target_rate {
        mono
    } else {
        crate::audio::wav::resample(&mono, source_rate, target_rate)
    }
}

impl FrameSource for CpalFrameSource {
    fn open(&mut self) -> Result<()> {
        use std::sync::atomic::Ordering;

        if self.stream.is_some() {
            return Ok(()); // Already open
        }

        let (tx, rx) = unbounded();
        self.callback_count.store(0, Ordering::Relaxed);

        let stream = self.build_stream(tx.clone())?;
        stream.play().map_err(|e| HarkError::AudioCapture {
            message: format!("Failed to start audio stream: {}", e),
        })?;

        // Wait briefly to check if the CPAL callback actually fires.
        // Some PipeWire-ALSA setups accept non-native configs but never deliver data.
        std::thread::sleep(Duration::from_millis(200));

        let final_stream = if self.callback_count.load(Ordering::Relaxed) == 0 {
            // Preferred config didn't deliver data — stop it, drain, try native
            drop(stream);
            while rx.try_recv().is_ok() {}

            let native_stream = self.build_stream_native(tx)?;
            native_stream.play().map_err(|e| HarkError::AudioCapture {
                message: format!("Failed to start native audio stream: {}", e),
            })?;
            native_stream
        } else {
            stream
        };

        self.stream = Some(SendableStream(final_stream));
        self.rx = Some(rx);
        self.pending.clear();
        Ok(())
    }

    fn read_frame(&mut self, frame_size: usize) -> Result<Option<Vec<i16>>> {
        let rx = self.rx.as_ref().ok_or_else(|| HarkError::AudioCapture {
            message: "Audio stream not open".to_string(),
        })?;

        let stall_timeout = Duration::from_millis(defaults::READ_STALL_TIMEOUT_MS);

        while self.pending.len() < frame_size {
            match rx.recv_timeout(stall_timeout) {
                Ok(chunk) => self.pending.extend_from_slice(&chunk),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(HarkError::AudioCapture {
                        message: format!(
                            "Audio stream stalled: no samples for {}ms",
                            defaults::READ_STALL_TIMEOUT_MS
                        ),
                    });
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(HarkError::AudioCapture {
                        message: "Audio stream closed unexpectedly".to_string(),
                    });
                }
            }
        }

        let frame: Vec<i16> = self.pending.drain(..frame_size).collect();
        Ok(Some(frame))
    }

    fn close(&mut self) -> Result<()> {
        if let Some(sendable_stream) = self.stream.take() {
            sendable_stream
                .0
                .pause()
                .map_err(|e| HarkError::AudioCapture {
                    message: format!("Failed to stop audio stream: {}", e),
                })?;
        }
        self.rx = None;
        self.pending.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_filter_device() {
        assert!(should_filter_device("surround51"));
        assert!(should_filter_device("front:CARD=PCH"));
        assert!(should_filter_device("HDMI Output"));
        assert!(should_filter_device("Digital Output S/PDIF"));
        assert!(!should_filter_device("pipewire"));
        assert!(!should_filter_device("PulseAudio"));
        assert!(!should_filter_device("Built-in Audio"));
    }

    #[test]
    fn test_is_preferred_device() {
        assert!(is_preferred_device("pipewire"));
        assert!(is_preferred_device("PipeWire"));
        assert!(is_preferred_device("pulse"));
        assert!(is_preferred_device("PulseAudio"));
        assert!(!is_preferred_device("hw:0,0"));
        assert!(!is_preferred_device("default"));
    }

    #[test]
    fn test_convert_mono_same_rate_is_identity() {
        let samples = vec![1i16, 2, 3, 4];
        assert_eq!(convert_to_mono_16khz_i16(&samples, 1, 16000, 16000), samples);
    }

    #[test]
    fn test_convert_stereo_averages_channels() {
        let samples = vec![100i16, 200, -100, 100];
        assert_eq!(
            convert_to_mono_16khz_i16(&samples, 2, 16000, 16000),
            vec![150i16, 0]
        );
    }

    #[test]
    fn test_create_with_invalid_device_name() {
        let source = CpalFrameSource::new(Some("NonExistentDevice12345"));
        assert!(source.is_err());
        match source {
            Err(HarkError::AudioDeviceNotFound { device }) => {
                assert_eq!(device, "NonExistentDevice12345");
            }
            _ => panic!("Expected AudioDeviceNotFound error"),
        }
    }

    #[test]
    fn test_read_before_open_is_an_error() {
        if let Ok(mut source) = CpalFrameSource::new(None) {
            assert!(source.read_frame(480).is_err());
        }
    }

    #[test]
    #[ignore] // Requires audio hardware
    fn test_list_devices_returns_at_least_one_device() {
        let devices = list_devices().unwrap();
        assert!(!devices.is_empty(), "Expected at least one audio device");
    }

    #[test]
    #[ignore] // Requires audio hardware
    fn test_open_read_close_cycle() {
        let mut source = CpalFrameSource::new(None).expect("Failed to create frame source");

        source.open().expect("Failed to open");
        let frame = source.read_frame(480).expect("Failed to read frame");
        assert_eq!(frame.map(|f| f.len()), Some(480));
        source.close().expect("Failed to close");
    }

    #[test]
    #[ignore] // Requires audio hardware
    fn test_open_is_idempotent() {
        let mut source = CpalFrameSource::new(None).expect("Failed to create frame source");
        source.open().expect("first open");
        source.open().expect("second open");
        source.close().expect("close");
    }
}
