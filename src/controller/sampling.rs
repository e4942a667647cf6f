use super::Inner;
use crate::events::AppEvent;
use crate::vision::change::Change;
use crate::vision::overlay::{OverlayBox, project};
use crate::vision::sampler::{Begin, SampleOutcome, timer_period};
use crate::vision::types::{Detection, labels_of};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Start the fixed-period sampler. The first tick fires one period after
/// the start.
pub(super) fn spawn_timer(inner: &Arc<Inner>, interval_ms: u32) -> JoinHandle<()> {
    let weak = Arc::downgrade(inner);
    let period = timer_period(interval_ms);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let Some(inner) = weak.upgrade() else {
                break;
            };
            // Each tick runs on its own so a slow detector does not hold
            // back the timer
            tokio::spawn(async move {
                tick(&inner).await;
            });
        }
    })
}

pub(super) async fn tick(inner: &Inner) -> SampleOutcome {
    let (detector, frame, ticket) = {
        let mut state = inner.state();
        if !state.camera.on {
            return SampleOutcome::CameraOff;
        }
        let Some(detector) = state.detector.clone() else {
            return SampleOutcome::NoDetector;
        };
        let frame = inner.source.current_frame();
        let begin = state.sampler.begin(frame.is_some(), inner.skip_if_busy);
        match (begin, frame) {
            (Begin::Detect(ticket), Some(frame)) => (detector, frame, ticket),
            (Begin::WarmUp, _) => {
                log::debug!("Video ready");
                return SampleOutcome::WarmUp;
            }
            (Begin::Busy, _) => return SampleOutcome::Busy,
            _ => return SampleOutcome::NotReady,
        }
    };

    let result = detector.detect(&frame).await;

    let mut state = inner.state();
    if !state.sampler.finish(ticket) {
        log::debug!("Discarding stale detections from tick {}", ticket.sequence);
        return SampleOutcome::Stale {
            sequence: ticket.sequence,
        };
    }
    let detections = match result {
        Ok(detections) => detections,
        Err(e) => {
            // The overlay keeps the previous tick; sampling continues
            let message = e.to_string();
            inner.emit(AppEvent::DetectorFailed {
                message: message.clone(),
            });
            return SampleOutcome::Failed { message };
        }
    };

    let labels = labels_of(&detections);
    state.history.record(&labels);
    match state.change.observe(&labels) {
        Change::Unchanged => state.pending.clear(),
        Change::Changed(labels) => state.pending.replace(labels),
    }

    let boxes = overlay_boxes(inner, &detections, (frame.width, frame.height));
    inner.overlay.render(&boxes);
    inner.emit(AppEvent::Detections {
        sequence: ticket.sequence,
        labels: labels.clone(),
    });
    SampleOutcome::Detected {
        sequence: ticket.sequence,
        labels,
    }
}

fn overlay_boxes(inner: &Inner, detections: &[Detection], source: (u32, u32)) -> Vec<OverlayBox> {
    let display = inner.source.display_size();
    detections
        .iter()
        .filter_map(|d| {
            let (left, top, width, height) = project(&d.bbox, source, display)?;
            Some(OverlayBox {
                left,
                top,
                width,
                height,
                label: inner.catalog.display_name(&d.label).to_string(),
            })
        })
        .collect()
}
