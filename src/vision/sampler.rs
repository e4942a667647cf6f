//! Frame sampler bookkeeping.
//!
//! The sampler runs on a fixed period while the camera is on. The first tick
//! that finds frame data only marks the video as ready; detection starts on
//! the tick after. Every detecting tick gets a start sequence number so that
//! a slow detector call finishing after a newer one is discarded.

use crate::defaults;
use std::time::Duration;

/// What one sampler tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleOutcome {
    CameraOff,
    /// The detector has not been loaded.
    NoDetector,
    /// The video source has no frame data yet.
    NotReady,
    /// First tick with frame data; consumed to confirm readiness.
    WarmUp,
    /// A previous detector call is still running.
    Busy,
    Detected { sequence: u64, labels: Vec<String> },
    /// Finished after a newer tick was applied, or after the camera stopped.
    Stale { sequence: u64 },
    Failed { message: String },
}

/// Handed out when a detecting tick starts; returned when it finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub sequence: u64,
    epoch: u64,
}

/// Result of trying to start a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Begin {
    NotReady,
    WarmUp,
    Busy,
    Detect(Ticket),
}

#[derive(Debug, Clone, Default)]
pub struct SamplerState {
    video_ready: bool,
    in_flight: usize,
    next_sequence: u64,
    last_applied: Option<u64>,
    /// Bumped whenever the camera stops; tickets from older epochs are stale.
    epoch: u64,
}

impl SamplerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to start a tick given whether the source currently has a frame.
    pub fn begin(&mut self, frame_available: bool, skip_if_busy: bool) -> Begin {
        if !frame_available {
            return Begin::NotReady;
        }
        if !self.video_ready {
            self.video_ready = true;
            return Begin::WarmUp;
        }
        if skip_if_busy && self.in_flight > 0 {
            return Begin::Busy;
        }
        self.in_flight += 1;
        self.next_sequence += 1;
        Begin::Detect(Ticket {
            sequence: self.next_sequence,
            epoch: self.epoch,
        })
    }

    /// Finish a tick. Returns true if its result should be applied.
    pub fn finish(&mut self, ticket: Ticket) -> bool {
        if ticket.epoch != self.epoch {
            return false;
        }
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.last_applied.is_some_and(|last| ticket.sequence <= last) {
            return false;
        }
        self.last_applied = Some(ticket.sequence);
        true
    }

    /// Forget readiness and in-flight calls; outstanding tickets become stale.
    pub fn reset(&mut self) {
        self.video_ready = false;
        self.in_flight = 0;
        self.epoch += 1;
    }

    pub fn is_video_ready(&self) -> bool {
        self.video_ready
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

/// Timer period for a detection frequency in milliseconds.
pub fn timer_period(interval_ms: u32) -> Duration {
    Duration::from_millis(u64::from(interval_ms).max(defaults::MIN_TIMER_PERIOD_MS))
}
