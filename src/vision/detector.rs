use crate::error::{Result, ScannerError};
use crate::vision::types::{BoundingBox, Detection, VideoFrame};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Trait for object detection inference.
///
/// The model itself is opaque: a frame goes in, labeled boxes come out.
#[async_trait::async_trait]
pub trait Detector: Send + Sync {
    /// Run detection on one frame.
    async fn detect(&self, frame: &VideoFrame) -> Result<Vec<Detection>>;

    /// Name of the loaded model
    fn name(&self) -> &str;
}

/// Loads a detector instance. Loading may fetch a model and can fail.
#[async_trait::async_trait]
pub trait DetectorLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn Detector>>;
}

/// Lifecycle of the detection model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    #[default]
    Start,
    Loading,
    Ready,
    Error,
}

impl std::fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ModelStatus::Start => "START",
            ModelStatus::Loading => "LOADING",
            ModelStatus::Ready => "READY",
            ModelStatus::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// Loader that hands out an already constructed detector.
pub struct ReadyLoader {
    detector: Arc<dyn Detector>,
}

impl ReadyLoader {
    pub fn new(detector: Arc<dyn Detector>) -> Self {
        Self { detector }
    }
}

#[async_trait::async_trait]
impl DetectorLoader for ReadyLoader {
    async fn load(&self) -> Result<Arc<dyn Detector>> {
        Ok(Arc::clone(&self.detector))
    }
}

/// Loader that always fails, for exercising the ERROR model state.
#[derive(Debug, Clone)]
pub struct FailingLoader {
    message: String,
}

impl FailingLoader {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl DetectorLoader for FailingLoader {
    async fn load(&self) -> Result<Arc<dyn Detector>> {
        Err(ScannerError::DetectorLoad {
            message: self.message.clone(),
        })
    }
}

/// Detector replaying a recorded feed: one detection list per call.
///
/// Once the feed is exhausted the last entry repeats, or the feed starts
/// over when looping is enabled.
#[derive(Debug)]
pub struct ScriptedDetector {
    name: String,
    feed: Vec<Vec<Detection>>,
    cursor: AtomicUsize,
    looping: bool,
}

impl ScriptedDetector {
    pub fn new(feed: Vec<Vec<Detection>>) -> Self {
        Self {
            name: "scripted".to_string(),
            feed,
            cursor: AtomicUsize::new(0),
            looping: false,
        }
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Parse a feed: a JSON array of frames, each an array of detections.
    pub fn from_json(json: &str) -> Result<Self> {
        let feed: Vec<Vec<Detection>> =
            serde_json::from_str(json).map_err(|e| ScannerError::DetectionScript {
                message: e.to_string(),
            })?;
        Ok(Self::new(feed))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| ScannerError::DetectionScript {
            message: format!("{}: {e}", path.display()),
        })?;
        let mut detector = Self::from_json(&json)?;
        detector.name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(detector.name);
        Ok(detector)
    }

    pub fn len(&self) -> usize {
        self.feed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feed.is_empty()
    }
}

#[async_trait::async_trait]
impl Detector for ScriptedDetector {
    async fn detect(&self, _frame: &VideoFrame) -> Result<Vec<Detection>> {
        if self.feed.is_empty() {
            return Ok(Vec::new());
        }
        let i = self.cursor.fetch_add(1, Ordering::SeqCst);
        let index = if self.looping {
            i % self.feed.len()
        } else {
            i.min(self.feed.len() - 1)
        };
        Ok(self.feed[index].clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Loader that parses a scripted feed from disk when loaded.
#[derive(Debug, Clone)]
pub struct ScriptLoader {
    path: PathBuf,
    looping: bool,
}

impl ScriptLoader {
    pub fn new(path: PathBuf, looping: bool) -> Self {
        Self { path, looping }
    }
}

#[async_trait::async_trait]
impl DetectorLoader for ScriptLoader {
    async fn load(&self) -> Result<Arc<dyn Detector>> {
        let path = self.path.clone();
        let looping = self.looping;
        let detector = tokio::task::spawn_blocking(move || ScriptedDetector::from_file(&path))
            .await
            .map_err(|e| ScannerError::DetectorLoad {
                message: e.to_string(),
            })?
            .map_err(|e| ScannerError::DetectorLoad {
                message: e.to_string(),
            })?;
        Ok(Arc::new(detector.looping(looping)))
    }
}

/// Mock detector for testing
///
/// Returns queued responses in order, then the fallback response.
#[derive(Debug, Default)]
pub struct MockDetector {
    queue: Mutex<VecDeque<Vec<Detection>>>,
    fallback: Vec<Detection>,
    delay: Option<Duration>,
    should_fail: bool,
    calls: AtomicUsize,
}

impl MockDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Response used once the queue is empty.
    pub fn with_fallback(mut self, labels: &[&str]) -> Self {
        self.fallback = detections_for(labels);
        self
    }

    /// Queue one response.
    pub fn then(self, labels: &[&str]) -> Self {
        self.push(labels);
        self
    }

    /// Simulate slow inference.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Configure the mock to fail on detect
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    pub fn push(&self, labels: &[&str]) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(detections_for(labels));
    }

    /// Number of detect calls started so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Detector for MockDetector {
    async fn detect(&self, _frame: &VideoFrame) -> Result<Vec<Detection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.should_fail {
            return Err(ScannerError::Detection {
                message: "mock detection failure".to_string(),
            });
        }
        let next = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        Ok(next.unwrap_or_else(|| self.fallback.clone()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Detections with the given labels laid out left to right.
pub fn detections_for(labels: &[&str]) -> Vec<Detection> {
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            Detection::new(
                label,
                BoundingBox::new(i as f32 * 100.0, 10.0, 80.0, 120.0),
                0.9,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::types::labels_of;

    fn frame() -> VideoFrame {
        VideoFrame::blank(640, 480)
    }

    #[tokio::test]
    async fn test_scripted_detector_holds_last_frame() {
        let detector = ScriptedDetector::new(vec![
            detections_for(&["person"]),
            detections_for(&["cup", "laptop"]),
        ]);
        assert_eq!(labels_of(&detector.detect(&frame()).await.unwrap()), ["person"]);
        assert_eq!(
            labels_of(&detector.detect(&frame()).await.unwrap()),
            ["cup", "laptop"]
        );
        assert_eq!(
            labels_of(&detector.detect(&frame()).await.unwrap()),
            ["cup", "laptop"]
        );
    }

    #[tokio::test]
    async fn test_scripted_detector_loops() {
        let detector = ScriptedDetector::new(vec![
            detections_for(&["a"]),
            detections_for(&["b"]),
        ])
        .looping(true);
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.extend(labels_of(&detector.detect(&frame()).await.unwrap()));
        }
        assert_eq!(seen, ["a", "b", "a", "b"]);
    }

    #[tokio::test]
    async fn test_scripted_detector_empty_feed() {
        let detector = ScriptedDetector::new(Vec::new());
        assert!(detector.is_empty());
        assert!(detector.detect(&frame()).await.unwrap().is_empty());
    }

    #[test]
    fn test_scripted_detector_rejects_bad_json() {
        let err = ScriptedDetector::from_json("[{]").unwrap_err();
        assert!(matches!(err, ScannerError::DetectionScript { .. }));
    }

    #[test]
    fn test_scripted_detector_from_json() {
        let json = r#"[[{"bbox":[0,0,10,10],"class":"dog","score":0.5}], []]"#;
        let detector = ScriptedDetector::from_json(json).unwrap();
        assert_eq!(detector.len(), 2);
    }

    #[tokio::test]
    async fn test_mock_detector_queue_then_fallback() {
        let detector = MockDetector::new()
            .then(&["person"])
            .with_fallback(&["cup"]);
        assert_eq!(labels_of(&detector.detect(&frame()).await.unwrap()), ["person"]);
        assert_eq!(labels_of(&detector.detect(&frame()).await.unwrap()), ["cup"]);
        assert_eq!(detector.calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_detector_failure() {
        let detector = MockDetector::new().with_failure();
        let err = detector.detect(&frame()).await.unwrap_err();
        assert!(matches!(err, ScannerError::Detection { .. }));
    }

    #[tokio::test]
    async fn test_failing_loader() {
        let loader = FailingLoader::new("network down");
        let err = loader.load().await.err().unwrap();
        assert_eq!(
            err.to_string(),
            "Object detector failed to load: network down"
        );
    }

    #[tokio::test]
    async fn test_script_loader_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.json");
        std::fs::write(&path, r#"[[{"bbox":[1,2,3,4],"class":"cat","score":0.7}]]"#).unwrap();

        let detector = ScriptLoader::new(path, false).load().await.unwrap();
        assert_eq!(detector.name(), "feed");
        assert_eq!(labels_of(&detector.detect(&frame()).await.unwrap()), ["cat"]);
    }

    #[tokio::test]
    async fn test_script_loader_missing_file_is_load_error() {
        let loader = ScriptLoader::new(PathBuf::from("/nonexistent/feed.json"), false);
        let err = loader.load().await.err().unwrap();
        assert!(matches!(err, ScannerError::DetectorLoad { .. }));
    }

    #[test]
    fn test_model_status_display() {
        assert_eq!(ModelStatus::Loading.to_string(), "LOADING");
        assert_eq!(ModelStatus::default(), ModelStatus::Start);
    }

    #[test]
    fn test_detector_trait_is_object_safe() {
        let detector: Arc<dyn Detector> = Arc::new(MockDetector::new());
        assert_eq!(detector.name(), "mock");
    }
}
