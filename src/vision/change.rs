//! Decides whether a tick's labels carry new information.
//!
//! Labels are compared by their comma-joined form in detector order, so the
//! comparison is order-sensitive: `[a, b]` followed by `[b, a]` counts as a
//! change.

/// Result of comparing a tick against the previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Same labels in the same order as last tick.
    Unchanged,
    /// Different labels; carries the new list as returned by the detector.
    Changed(Vec<String>),
}

/// Tracks the previous tick's labels.
#[derive(Debug, Clone, Default)]
pub struct ChangeDetector {
    last_seen: String,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `labels` with the previous tick and remember them.
    pub fn observe(&mut self, labels: &[String]) -> Change {
        let key = canonical(labels);
        if key == self.last_seen {
            Change::Unchanged
        } else {
            self.last_seen = key;
            Change::Changed(labels.to_vec())
        }
    }

    /// Forget the previous tick.
    pub fn reset(&mut self) {
        self.last_seen.clear();
    }
}

fn canonical(labels: &[String]) -> String {
    labels.join(",")
}
