//! Error types for scannercam.

use crate::events::Alert;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScannerError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Detector errors
    #[error("Object detector failed to load: {message}")]
    DetectorLoad { message: String },

    #[error("Object detection failed: {message}")]
    Detection { message: String },

    #[error("Detection script error: {message}")]
    DetectionScript { message: String },

    // Speech errors
    #[error("Speech synthesis is not supported on this system")]
    SpeechUnsupported,

    #[error("No synthesizer voice available for locale {locale}")]
    NoVoiceForLocale { locale: String },

    #[error("Speech tool not found: {tool}")]
    SpeechToolNotFound { tool: String },

    #[error("Speech synthesis failed: {message}")]
    SpeechFailed { message: String },

    // Settings store errors
    #[error("Detection frequency {value}ms is outside the allowed range 0..={max}ms")]
    DetectionFrequencyOutOfRange { value: u32, max: u32 },

    #[error("Settings store error: {message}")]
    Store { message: String },

    // User-visible rejection of an action
    #[error("Action rejected: {alert}")]
    Rejected { alert: Alert },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl ScannerError {
    /// Returns the alert if this error is a user-visible rejection.
    pub fn alert(&self) -> Option<Alert> {
        match self {
            ScannerError::Rejected { alert } => Some(*alert),
            _ => None,
        }
    }
}

impl From<Alert> for ScannerError {
    fn from(alert: Alert) -> Self {
        ScannerError::Rejected { alert }
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ScannerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_file_not_found_display() {
        let error = ScannerError::ConfigFileNotFound {
            path: "/path/to/config.toml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found at /path/to/config.toml"
        );
    }

    #[test]
    fn test_config_invalid_value_display() {
        let error = ScannerError::ConfigInvalidValue {
            key: "sampler.interval_ms".to_string(),
            message: "must be at most 2000".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for sampler.interval_ms: must be at most 2000"
        );
    }

    #[test]
    fn test_no_voice_for_locale_display() {
        let error = ScannerError::NoVoiceForLocale {
            locale: "xx-YY".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "No synthesizer voice available for locale xx-YY"
        );
    }

    #[test]
    fn test_frequency_out_of_range_display() {
        let error = ScannerError::DetectionFrequencyOutOfRange {
            value: 2500,
            max: 2000,
        };
        assert_eq!(
            error.to_string(),
            "Detection frequency 2500ms is outside the allowed range 0..=2000ms"
        );
    }

    #[test]
    fn test_rejected_carries_alert() {
        let error: ScannerError = Alert::CameraInactive.into();
        assert_eq!(error.alert(), Some(Alert::CameraInactive));
        assert!(error.to_string().starts_with("Action rejected"));

        let other = ScannerError::Other("x".to_string());
        assert_eq!(other.alert(), None);
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: ScannerError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_error = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let error: ScannerError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_source_chain_io() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let error: ScannerError = io_error.into();

        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.source().is_some());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<ScannerError>();
        assert_sync::<ScannerError>();
    }
}
