//! Narration scheduling: the state machine, the wait formula and the buffer
//! of labels waiting to be announced.

use crate::defaults;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the narration loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrationState {
    #[default]
    Inactive,
    /// Timed pause before the next announcement.
    Waiting,
    /// A speech request is being issued.
    Speaking,
}

impl NarrationState {
    pub fn is_active(self) -> bool {
        self != NarrationState::Inactive
    }
}

impl std::fmt::Display for NarrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NarrationState::Inactive => "INACTIVE",
            NarrationState::Waiting => "WAITING",
            NarrationState::Speaking => "SPEAKING",
        };
        f.write_str(s)
    }
}

/// Pause before announcing `count` pending labels.
///
/// One label waits 5s; any other count waits 3s per label, so an empty
/// buffer waits nothing.
pub fn wait_duration(count: usize) -> Duration {
    if count == 1 {
        Duration::from_millis(defaults::SINGLE_LABEL_WAIT_MS)
    } else {
        Duration::from_millis(defaults::PER_LABEL_WAIT_MS.saturating_mul(count as u64))
    }
}

/// The wait the loop actually sleeps. An empty buffer is re-checked after a
/// short idle period instead of spinning.
pub fn loop_wait(count: usize) -> Duration {
    if count == 0 {
        Duration::from_millis(defaults::IDLE_RECHECK_MS)
    } else {
        wait_duration(count)
    }
}

/// Labels currently visible and not yet announced, in detector order.
///
/// Duplicates are kept: two people in frame are two pending labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingLabels {
    labels: Vec<String>,
}

impl PendingLabels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole buffer.
    pub fn replace(&mut self, labels: Vec<String>) {
        self.labels = labels;
    }

    pub fn clear(&mut self) {
        self.labels.clear();
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
