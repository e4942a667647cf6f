//! Data types flowing from the video source through the detector.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Axis-aligned box in source-frame pixel units.
///
/// Serialized as `[x, y, width, height]`, the layout detector feeds use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from([x, y, width, height]: [f32; 4]) -> Self {
        Self::new(x, y, width, height)
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x, b.y, b.width, b.height]
    }
}

/// One labeled object found in a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    #[serde(rename = "class")]
    pub label: String,
    pub score: f32,
}

impl Detection {
    pub fn new(label: &str, bbox: BoundingBox, score: f32) -> Self {
        Self {
            bbox,
            label: label.to_string(),
            score,
        }
    }
}

/// Labels of a detection list, in detector order.
pub fn labels_of(detections: &[Detection]) -> Vec<String> {
    detections.iter().map(|d| d.label.clone()).collect()
}

/// A decoded video frame handed to the detector.
///
/// Pixel data is shared, cloning a frame is cheap.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    /// RGBA pixels, row-major. May be empty for synthetic sources.
    pub pixels: Arc<[u8]>,
    pub captured_at: Instant,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, pixels: Arc<[u8]>) -> Self {
        Self {
            width,
            height,
            pixels,
            captured_at: Instant::now(),
        }
    }

    /// A frame with dimensions but no pixel data.
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(width, height, Arc::from(Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_parses_feed_layout() {
        let json = r#"{"bbox":[10.0,20.0,30.0,40.0],"class":"person","score":0.87}"#;
        let detection: Detection = serde_json::from_str(json).unwrap();
        assert_eq!(detection.label, "person");
        assert_eq!(detection.bbox, BoundingBox::new(10.0, 20.0, 30.0, 40.0));
        assert!((detection.score - 0.87).abs() < f32::EPSILON);
    }

    #[test]
    fn test_bbox_serializes_as_array() {
        let json = serde_json::to_string(&BoundingBox::new(1.0, 2.0, 3.0, 4.0)).unwrap();
        assert_eq!(json, "[1.0,2.0,3.0,4.0]");
    }

    #[test]
    fn test_labels_of_keeps_order_and_duplicates() {
        let b = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let detections = vec![
            Detection::new("cup", b, 0.9),
            Detection::new("person", b, 0.8),
            Detection::new("cup", b, 0.7),
        ];
        assert_eq!(labels_of(&detections), vec!["cup", "person", "cup"]);
    }

    #[test]
    fn test_blank_frame_has_no_pixels() {
        let frame = VideoFrame::blank(640, 480);
        assert_eq!((frame.width, frame.height), (640, 480));
        assert!(frame.pixels.is_empty());
    }
}
