//! scannercam - Real-time object recognition with spoken narration
//!
//! A camera feed is sampled on a timer, an object detector labels each
//! frame, and a narration loop periodically speaks the objects that newly
//! appeared.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod account;
#[cfg(feature = "cli")]
pub mod app;
pub mod camera;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod controller;
pub mod defaults;
pub mod error;
pub mod events;
pub mod i18n;
pub mod narration;
#[cfg(feature = "cli")]
pub mod output;
pub mod speech;
pub mod store;
pub mod vision;

// Controller and its seams
pub use camera::{CameraState, FacingMode, VideoSource};
pub use controller::{Controller, ControllerBuilder, ControllerConfig, Platform};
pub use speech::{SpeechChannel, SpeechSynthesizer};
pub use vision::{Connectivity, Detector, DetectorLoader, OverlayRenderer};

// State
pub use narration::NarrationState;
pub use vision::{ModelStatus, SampleOutcome};

// Events
pub use events::{Alert, AppEvent, EventSink};

// Settings
pub use account::{Account, Dashboard};
pub use store::{SettingsStore, UserDocument};

// Error handling
pub use error::{Result, ScannerError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{version}+{hash}"),
        _ => version.to_string(),
    }
}
