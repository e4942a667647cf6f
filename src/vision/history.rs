/// Every label seen during the session, each once, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionHistory {
    labels: Vec<String>,
}

impl DetectionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a tick's labels. Returns how many were new to the session.
    pub fn record(&mut self, labels: &[String]) -> usize {
        let before = self.labels.len();
        for label in labels {
            if !self.labels.contains(label) {
                self.labels.push(label.clone());
            }
        }
        self.labels.len() - before
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_history_deduplicates_across_ticks() {
        let mut history = DetectionHistory::new();
        assert_eq!(history.record(&labels(&["person", "cup", "person"])), 2);
        assert_eq!(history.record(&labels(&["laptop", "cup"])), 1);
        assert_eq!(history.labels(), labels(&["person", "cup", "laptop"]));
    }

    #[test]
    fn test_history_starts_empty() {
        let history = DetectionHistory::new();
        assert!(history.is_empty());
    }
}
