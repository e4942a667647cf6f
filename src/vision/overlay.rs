//! Bounding-box overlay drawn over the video.
//!
//! Detector boxes are in source-frame pixels; the overlay is drawn on the
//! display area, so each box is scaled per axis.

use crate::vision::types::BoundingBox;
use std::sync::{Mutex, PoisonError};

/// A box positioned on the display area.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    /// Translated, human-readable label.
    pub label: String,
}

/// Scale a source-frame box onto a display area.
///
/// Returns `None` when the source has no size yet.
pub fn project(
    bbox: &BoundingBox,
    source: (u32, u32),
    display: (f32, f32),
) -> Option<(f32, f32, f32, f32)> {
    let (video_w, video_h) = source;
    if video_w == 0 || video_h == 0 {
        return None;
    }
    let (client_w, client_h) = display;
    let sx = client_w / video_w as f32;
    let sy = client_h / video_h as f32;
    Some((bbox.x * sx, bbox.y * sy, bbox.width * sx, bbox.height * sy))
}

/// Receives the boxes to show for the latest tick.
pub trait OverlayRenderer: Send + Sync {
    /// Replace whatever is shown with `boxes`.
    fn render(&self, boxes: &[OverlayBox]);

    /// Remove all boxes.
    fn clear(&self);
}

/// Keeps the current overlay in memory.
#[derive(Debug, Default)]
pub struct RecordingOverlay {
    inner: Mutex<RecordingState>,
}

#[derive(Debug, Default)]
struct RecordingState {
    boxes: Vec<OverlayBox>,
    renders: usize,
    clears: usize,
}

impl RecordingOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxes(&self) -> Vec<OverlayBox> {
        self.state().boxes.clone()
    }

    pub fn labels(&self) -> Vec<String> {
        self.state().boxes.iter().map(|b| b.label.clone()).collect()
    }

    pub fn render_count(&self) -> usize {
        self.state().renders
    }

    pub fn clear_count(&self) -> usize {
        self.state().clears
    }

    fn state(&self) -> std::sync::MutexGuard<'_, RecordingState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OverlayRenderer for RecordingOverlay {
    fn render(&self, boxes: &[OverlayBox]) {
        let mut state = self.state();
        state.boxes = boxes.to_vec();
        state.renders += 1;
    }

    fn clear(&self) {
        let mut state = self.state();
        state.boxes.clear();
        state.clears += 1;
    }
}

/// Prints the overlay as one line per change on stderr.
#[derive(Debug, Default)]
pub struct TerminalOverlay {
    last: Mutex<String>,
}

impl TerminalOverlay {
    pub fn new() -> Self {
        Self::default()
    }
}

/// One-line summary of an overlay, e.g. `person@(10,20 80x120)`.
pub fn describe(boxes: &[OverlayBox]) -> String {
    boxes
        .iter()
        .map(|b| {
            format!(
                "{}@({:.0},{:.0} {:.0}x{:.0})",
                b.label, b.left, b.top, b.width, b.height
            )
        })
        .collect::<Vec<_>>()
        .join("  ")
}

impl OverlayRenderer for TerminalOverlay {
    fn render(&self, boxes: &[OverlayBox]) {
        let line = describe(boxes);
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        // Unchanged overlays are not reprinted
        if *last != line {
            if !line.is_empty() {
                eprintln!("[overlay] {line}");
            }
            *last = line;
        }
    }

    fn clear(&self) {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
