//! Error types for hark.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarkError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio capture errors
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    // Endpoint detection errors
    #[error("Endpoint detector error: {message}")]
    Endpoint { message: String },

    // Decoding errors
    #[error("Model not found at {path}")]
    ModelNotFound { path: String },

    #[error("Decoder initialization failed: {message}")]
    DecoderInit { message: String },

    #[error("Decoding failed: {message}")]
    Decode { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, HarkError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_file_not_found_display() {
        let error = HarkError::ConfigFileNotFound {
            path: "/home/user/.config/hark/config.toml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found at /home/user/.config/hark/config.toml"
        );
    }

    #[test]
    fn test_config_invalid_value_display() {
        let error = HarkError::ConfigInvalidValue {
            key: "endpoint.frame_ms".to_string(),
            message: "must be positive".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for endpoint.frame_ms: must be positive"
        );
    }

    #[test]
    fn test_audio_device_not_found_display() {
        let error = HarkError::AudioDeviceNotFound {
            device: "default".to_string(),
        };
        assert_eq!(error.to_string(), "Audio device not found: default");
    }

    #[test]
    fn test_audio_capture_display() {
        let error = HarkError::AudioCapture {
            message: "stream stalled".to_string(),
        };
        assert_eq!(error.to_string(), "Audio capture failed: stream stalled");
    }

    #[test]
    fn test_model_not_found_display() {
        let error = HarkError::ModelNotFound {
            path: "/models/ggml-base.bin".to_string(),
        };
        assert_eq!(error.to_string(), "Model not found at /models/ggml-base.bin");
    }

    #[test]
    fn test_decode_display() {
        let error = HarkError::Decode {
            message: "inference failed".to_string(),
        };
        assert_eq!(error.to_string(), "Decoding failed: inference failed");
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: HarkError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_str = "invalid = toml = syntax";
        let toml_error = toml::from_str::<toml::Value>(toml_str).unwrap_err();
        let error: HarkError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_source_chain_io() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let error: HarkError = io_error.into();

        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.source().is_some());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<HarkError>();
        assert_sync::<HarkError>();
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);
    }
}
