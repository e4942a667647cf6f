//! Default configuration constants for scannercam.
//!
//! Shared by the configuration layer, the controller and the settings store
//! so every default lives in exactly one place.

/// Default detection sampling interval in milliseconds.
///
/// Also the value stored in a freshly created user document.
pub const DETECTION_FREQUENCY_MS: u32 = 200;

/// Upper bound for the per-user detection frequency in milliseconds.
pub const MAX_DETECTION_FREQUENCY_MS: u32 = 2000;

/// Smallest timer period actually scheduled.
///
/// A frequency of 0 is a valid setting but not a valid timer period.
pub const MIN_TIMER_PERIOD_MS: u64 = 1;

/// Narration pause when exactly one label is pending.
pub const SINGLE_LABEL_WAIT_MS: u64 = 5000;

/// Narration pause per pending label when more than one is pending.
pub const PER_LABEL_WAIT_MS: u64 = 3000;

/// Recheck period of the narration loop while nothing is pending.
///
/// The pause formula yields zero for an empty set; this keeps the loop idle
/// instead of spinning.
pub const IDLE_RECHECK_MS: u64 = 200;

/// Poll period while waiting for the synthesizer's voice list.
pub const VOICE_POLL_MS: u64 = 100;

/// How long to poll for voices before giving up.
pub const VOICE_WAIT_MS: u64 = 3000;

/// Default speech rate (1.0 = normal).
pub const SPEECH_RATE: f32 = 1.0;

/// Default speech pitch. Slightly lowered for a calmer narrator voice.
pub const SPEECH_PITCH: f32 = 0.8;

/// Default speech volume (0.0 to 1.0).
pub const SPEECH_VOLUME: f32 = 1.0;

/// Locale used when neither the config nor the environment names one.
pub const DEFAULT_LOCALE: &str = "en-US";

/// Default overlay client area, in pixels.
pub const DISPLAY_WIDTH: f32 = 640.0;
pub const DISPLAY_HEIGHT: f32 = 480.0;

/// Host used by the connectivity probe before loading the detector.
pub const CONNECTIVITY_PROBE_ADDR: &str = "1.1.1.1:443";

/// Connectivity probe timeout in milliseconds.
pub const CONNECTIVITY_TIMEOUT_MS: u64 = 1500;

/// Capacity of the event channel used by the CLI.
pub const EVENT_BUFFER: usize = 256;
