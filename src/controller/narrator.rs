use super::Inner;
use crate::events::AppEvent;
use crate::narration::{NarrationState, loop_wait};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;

/// Counts a loop as live from spawn until its future is dropped, including
/// when it is aborted before its first poll.
struct LiveLoop(Arc<AtomicUsize>);

impl LiveLoop {
    fn new(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for LiveLoop {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Start the narration loop for one activation.
pub(super) fn spawn_loop(inner: &Arc<Inner>, generation: u64) -> JoinHandle<()> {
    let live = LiveLoop::new(&inner.live_loops);
    let weak = Arc::downgrade(inner);
    tokio::spawn(async move {
        let _live = live;
        run(weak, generation).await;
        log::debug!("Narration loop {generation} finished");
    })
}

async fn run(weak: Weak<Inner>, generation: u64) {
    loop {
        // The wait is recomputed from the buffer as it is right now
        let (wait, idle) = {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let mut state = inner.state();
            if state.generation != generation || !state.narration.is_active() {
                return;
            }
            state.narration = NarrationState::Waiting;
            let count = state.pending.len();
            (loop_wait(count), count == 0)
        };

        tokio::time::sleep(wait).await;

        // Labels that showed up during an idle re-check still get their
        // full wait on the next iteration
        if idle {
            continue;
        }

        let Some(inner) = weak.upgrade() else {
            return;
        };
        if !speak_pending(&inner, generation) {
            return;
        }
    }
}

/// Announce the pending labels, if any. Returns false once this loop's
/// activation has ended.
fn speak_pending(inner: &Inner, generation: u64) -> bool {
    let mut state = inner.state();
    if state.generation != generation || !state.narration.is_active() {
        return false;
    }
    let Some(text) = inner.catalog.narration_sentence(state.pending.as_slice()) else {
        return true;
    };

    // Issued under the lock so a concurrent toggle-off cannot slip between
    // the check above and the request
    state.narration = NarrationState::Speaking;
    match inner.speech.announce(&text) {
        Ok(()) => {
            state.pending.clear();
            inner.emit(AppEvent::Narrated { text });
        }
        Err(e) => {
            log::warn!("Narration failed: {e}");
            inner.emit(AppEvent::SpeechFailed {
                message: e.to_string(),
            });
        }
    }
    state.narration = NarrationState::Waiting;
    true
}
