//! Object detection side of the controller: frames in, labeled boxes out.

pub mod change;
pub mod connectivity;
pub mod detector;
pub mod history;
pub mod overlay;
pub mod sampler;
pub mod types;

pub use change::{Change, ChangeDetector};
pub use connectivity::{Connectivity, StaticConnectivity, TcpProbe};
pub use detector::{Detector, DetectorLoader, MockDetector, ModelStatus, ScriptedDetector};
pub use history::DetectionHistory;
pub use overlay::{OverlayBox, OverlayRenderer, RecordingOverlay, TerminalOverlay};
pub use sampler::{SampleOutcome, SamplerState};
pub use types::{BoundingBox, Detection, VideoFrame};
