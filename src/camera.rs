//! Camera state and the video source seam.

use crate::vision::types::VideoFrame;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// Which physical camera is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front camera.
    #[default]
    User,
    /// Back camera.
    Environment,
}

impl FacingMode {
    pub fn flipped(self) -> Self {
        match self {
            FacingMode::User => FacingMode::Environment,
            FacingMode::Environment => FacingMode::User,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FacingMode::User => "user",
            FacingMode::Environment => "environment",
        }
    }
}

impl std::str::FromStr for FacingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" | "front" => Ok(FacingMode::User),
            "environment" | "back" => Ok(FacingMode::Environment),
            other => Err(format!(
                "unknown facing mode '{other}' (expected user or environment)"
            )),
        }
    }
}

/// Camera on/off plus facing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CameraState {
    pub on: bool,
    pub facing: FacingMode,
}

/// Source of decoded video frames.
///
/// This trait allows swapping implementations (real capture vs synthetic).
pub trait VideoSource: Send + Sync {
    /// The most recent decoded frame, or `None` while no frame data exists.
    fn current_frame(&self) -> Option<VideoFrame>;

    /// Size of the area the overlay is drawn on, in pixels.
    fn display_size(&self) -> (f32, f32);

    /// Called when the camera is switched to another facing mode.
    fn set_facing(&self, _facing: FacingMode) {}
}

/// Video source producing blank frames of a fixed size.
///
/// Starts without frame data until [`SyntheticSource::set_ready`] is called,
/// mimicking a stream that needs a moment to decode its first frame.
#[derive(Debug)]
pub struct SyntheticSource {
    width: u32,
    height: u32,
    display: (f32, f32),
    ready: AtomicBool,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32, display: (f32, f32)) -> Self {
        Self {
            width,
            height,
            display,
            ready: AtomicBool::new(false),
        }
    }

    /// A source that has frame data from the start.
    pub fn ready(width: u32, height: u32, display: (f32, f32)) -> Self {
        let source = Self::new(width, height, display);
        source.set_ready(true);
        source
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }
}

impl VideoSource for SyntheticSource {
    fn current_frame(&self) -> Option<VideoFrame> {
        self.ready
            .load(Ordering::SeqCst)
            .then(|| VideoFrame::blank(self.width, self.height))
    }

    fn display_size(&self) -> (f32, f32) {
        self.display
    }
}
