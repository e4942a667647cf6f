//! Application events and user-visible alerts.
//!
//! The controller reports everything observable through an [`EventSink`]:
//! the CLI renders them on stderr, tests collect them from a channel.

use crate::camera::FacingMode;
use crate::vision::detector::ModelStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// User-visible alert kinds.
///
/// The localized wording lives in the i18n catalogs; see
/// [`Catalog::alert`](crate::i18n::Catalog::alert).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alert {
    /// No network connection when the detector was about to load.
    Offline,
    /// Narration is not available on this platform.
    NarrationUnsupported,
    /// The action requires the camera to be on.
    CameraInactive,
    /// No speech synthesis capability.
    SpeechUnavailable,
    /// Settings were written to the store.
    ChangesSaved,
}

impl Alert {
    /// Catalog key for this alert's message.
    pub fn key(self) -> &'static str {
        match self {
            Alert::Offline => "offline",
            Alert::NarrationUnsupported => "narration_unsupported",
            Alert::CameraInactive => "camera_inactive",
            Alert::SpeechUnavailable => "speech_unavailable",
            Alert::ChangesSaved => "changes_saved",
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Events emitted by the controller and the account layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    ModelStatusChanged {
        status: ModelStatus,
    },
    CameraChanged {
        on: bool,
    },
    FacingChanged {
        facing: FacingMode,
    },
    NarrationChanged {
        active: bool,
    },
    IntervalChanged {
        interval_ms: u32,
    },
    /// Labels from one detecting tick, in detector order.
    Detections {
        sequence: u64,
        labels: Vec<String>,
    },
    Narrated {
        text: String,
    },
    Alert {
        alert: Alert,
        message: String,
    },
    DetectorFailed {
        message: String,
    },
    SpeechFailed {
        message: String,
    },
}

/// Receiver of application events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: AppEvent);
}

/// Forwards events to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: AppEvent) {
        match &event {
            AppEvent::DetectorFailed { message } | AppEvent::SpeechFailed { message } => {
                log::warn!("{message}");
            }
            AppEvent::Alert { alert, message } => log::warn!("alert {alert}: {message}"),
            AppEvent::Detections { sequence, labels } => {
                log::debug!("tick {sequence}: {labels:?}");
            }
            other => log::info!("{other:?}"),
        }
    }
}

/// Sends events over a bounded crossbeam channel without blocking.
///
/// Events are dropped when the channel is full or disconnected.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: crossbeam_channel::Sender<AppEvent>,
}

impl ChannelSink {
    pub fn new(tx: crossbeam_channel::Sender<AppEvent>) -> Self {
        Self { tx }
    }

    /// Creates a sink together with the receiving end.
    pub fn bounded(capacity: usize) -> (Self, crossbeam_channel::Receiver<AppEvent>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: AppEvent) {
        // Never blocks the controller on a slow or gone reader
        if let Err(e) = self.tx.try_send(event) {
            log::trace!("Event dropped: {e}");
        }
    }
}

/// Discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: AppEvent) {}
}
