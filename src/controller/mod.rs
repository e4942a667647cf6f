//! The Detection-Narration controller.
//!
//! One controller owns all loop state: camera, model, sampler bookkeeping,
//! the pending label buffer and the narration state. Two background tasks
//! run against it:
//!
//! - the sampler timer, alive while the camera is on
//! - the narration loop, alive while narration is on
//!
//! Both hold a weak reference, so dropping the controller ends them. All
//! state sits behind one mutex that is never held across an await point.

mod narrator;
mod sampling;

use crate::camera::{CameraState, FacingMode, VideoSource};
use crate::config::Config;
use crate::defaults;
use crate::error::{Result, ScannerError};
use crate::events::{Alert, AppEvent, EventSink, LogSink};
use crate::i18n::Catalog;
use crate::narration::{NarrationState, PendingLabels};
use crate::speech::{Prosody, SpeechChannel, SpeechSynthesizer};
use crate::vision::change::ChangeDetector;
use crate::vision::connectivity::{Connectivity, StaticConnectivity};
use crate::vision::detector::{Detector, DetectorLoader, ModelStatus};
use crate::vision::history::DetectionHistory;
use crate::vision::overlay::{OverlayRenderer, RecordingOverlay};
use crate::vision::sampler::{SampleOutcome, SamplerState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Platform-level narration policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Desktop,
    /// Narration cannot be activated.
    Ios,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "ios") {
            Platform::Ios
        } else {
            Platform::Desktop
        }
    }

    pub fn supports_narration(self) -> bool {
        self != Platform::Ios
    }
}

/// Tunables of a controller instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    /// Sampler period in milliseconds, 0..=2000.
    pub interval_ms: u32,
    /// Skip a tick while a detector call is still running.
    pub skip_if_busy: bool,
    pub locale: String,
    pub prosody: Prosody,
    pub voice_poll: Duration,
    pub voice_wait: Duration,
    pub platform: Platform,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            interval_ms: defaults::DETECTION_FREQUENCY_MS,
            skip_if_busy: true,
            locale: defaults::DEFAULT_LOCALE.to_string(),
            prosody: Prosody::default(),
            voice_poll: Duration::from_millis(defaults::VOICE_POLL_MS),
            voice_wait: Duration::from_millis(defaults::VOICE_WAIT_MS),
            platform: Platform::current(),
        }
    }
}

impl ControllerConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval_ms: config.sampler.interval_ms,
            skip_if_busy: config.sampler.skip_if_busy,
            locale: config.speech.resolved_locale(),
            prosody: config.speech.prosody(),
            voice_poll: Duration::from_millis(defaults::VOICE_POLL_MS),
            voice_wait: Duration::from_millis(config.speech.voice_wait_ms),
            platform: Platform::current(),
        }
    }
}

pub(crate) struct State {
    model_status: ModelStatus,
    loading: bool,
    detector: Option<Arc<dyn Detector>>,
    camera: CameraState,
    interval_ms: u32,
    sampler: SamplerState,
    change: ChangeDetector,
    pending: PendingLabels,
    history: DetectionHistory,
    narration: NarrationState,
    /// Bumped on every narration toggle; a loop only acts for its own value.
    generation: u64,
    /// An activation is waiting for voices to load.
    activating: bool,
    sampler_task: Option<JoinHandle<()>>,
    narration_task: Option<JoinHandle<()>>,
}

pub(crate) struct Inner {
    skip_if_busy: bool,
    voice_poll: Duration,
    voice_wait: Duration,
    platform: Platform,
    loader: Arc<dyn DetectorLoader>,
    source: Arc<dyn VideoSource>,
    overlay: Arc<dyn OverlayRenderer>,
    connectivity: Arc<dyn Connectivity>,
    events: Arc<dyn EventSink>,
    catalog: Catalog,
    speech: SpeechChannel,
    state: Mutex<State>,
    live_loops: Arc<AtomicUsize>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: AppEvent) {
        self.events.emit(event);
    }

    /// Report a rejected action and build the matching error.
    fn reject(&self, alert: Alert) -> ScannerError {
        self.emit(AppEvent::Alert {
            alert,
            message: self.catalog.alert(alert),
        });
        ScannerError::Rejected { alert }
    }

    fn set_model_status(&self, state: &mut State, status: ModelStatus) {
        if state.model_status != status {
            state.model_status = status;
            self.emit(AppEvent::ModelStatusChanged { status });
        }
    }

    /// Turn narration off. Speech already issued keeps playing.
    fn stop_narration(&self, state: &mut State) {
        state.generation += 1;
        state.activating = false;
        if let Some(task) = state.narration_task.take() {
            task.abort();
        }
        if state.narration.is_active() {
            state.narration = NarrationState::Inactive;
            self.emit(AppEvent::NarrationChanged { active: false });
        }
    }
}

/// Builder for [`Controller`].
pub struct ControllerBuilder {
    config: ControllerConfig,
    loader: Arc<dyn DetectorLoader>,
    source: Arc<dyn VideoSource>,
    synth: Arc<dyn SpeechSynthesizer>,
    overlay: Arc<dyn OverlayRenderer>,
    connectivity: Arc<dyn Connectivity>,
    events: Arc<dyn EventSink>,
    catalog: Option<Catalog>,
}

impl ControllerBuilder {
    pub fn config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn overlay(mut self, overlay: Arc<dyn OverlayRenderer>) -> Self {
        self.overlay = overlay;
        self
    }

    pub fn connectivity(mut self, connectivity: Arc<dyn Connectivity>) -> Self {
        self.connectivity = connectivity;
        self
    }

    pub fn events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Use a specific catalog instead of the built-in one for the locale.
    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn build(self) -> Result<Controller> {
        let config = self.config;
        if config.interval_ms > defaults::MAX_DETECTION_FREQUENCY_MS {
            return Err(ScannerError::DetectionFrequencyOutOfRange {
                value: config.interval_ms,
                max: defaults::MAX_DETECTION_FREQUENCY_MS,
            });
        }
        let catalog = match self.catalog {
            Some(catalog) => catalog,
            None => Catalog::for_locale(&config.locale)?,
        };
        let speech = SpeechChannel::new(self.synth, &config.locale, config.prosody);

        let state = State {
            model_status: ModelStatus::Start,
            loading: false,
            detector: None,
            camera: CameraState::default(),
            interval_ms: config.interval_ms,
            sampler: SamplerState::new(),
            change: ChangeDetector::new(),
            pending: PendingLabels::new(),
            history: DetectionHistory::new(),
            narration: NarrationState::Inactive,
            generation: 0,
            activating: false,
            sampler_task: None,
            narration_task: None,
        };

        Ok(Controller {
            inner: Arc::new(Inner {
                skip_if_busy: config.skip_if_busy,
                voice_poll: config.voice_poll,
                voice_wait: config.voice_wait,
                platform: config.platform,
                loader: self.loader,
                source: self.source,
                overlay: self.overlay,
                connectivity: self.connectivity,
                events: self.events,
                catalog,
                speech,
                state: Mutex::new(state),
                live_loops: Arc::new(AtomicUsize::new(0)),
            }),
        })
    }
}

/// Drives camera, detection and narration for one session.
///
/// Operations that start background work (`toggle_camera`,
/// `toggle_narration`, `set_detection_interval`) must be called from
/// within a tokio runtime.
pub struct Controller {
    inner: Arc<Inner>,
}

impl Controller {
    pub fn builder(
        loader: Arc<dyn DetectorLoader>,
        source: Arc<dyn VideoSource>,
        synth: Arc<dyn SpeechSynthesizer>,
    ) -> ControllerBuilder {
        ControllerBuilder {
            config: ControllerConfig::default(),
            loader,
            source,
            synth,
            overlay: Arc::new(RecordingOverlay::new()),
            connectivity: Arc::new(StaticConnectivity::online()),
            events: Arc::new(LogSink),
            catalog: None,
        }
    }

    /// Load the detector.
    ///
    /// Checks connectivity first; when offline nothing is loaded and the
    /// status stays LOADING. A failed load leaves the status at ERROR until
    /// `start` is called again.
    pub async fn start(&self) -> Result<()> {
        let inner = &self.inner;
        {
            let mut state = inner.state();
            if state.model_status == ModelStatus::Ready || state.loading {
                return Ok(());
            }
            state.loading = true;
            inner.set_model_status(&mut state, ModelStatus::Loading);
        }

        if !inner.connectivity.is_online().await {
            inner.state().loading = false;
            return Err(inner.reject(Alert::Offline));
        }

        let loaded = inner.loader.load().await;
        let mut state = inner.state();
        state.loading = false;
        match loaded {
            Ok(detector) => {
                log::info!("Detector '{}' loaded", detector.name());
                state.detector = Some(detector);
                inner.set_model_status(&mut state, ModelStatus::Ready);
                Ok(())
            }
            Err(e) => {
                log::error!("Detector load failed: {e}");
                inner.set_model_status(&mut state, ModelStatus::Error);
                inner.emit(AppEvent::DetectorFailed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Switch the camera on or off. Returns the new camera state.
    ///
    /// Switching off stops the sampler, turns narration off, clears the
    /// overlay and forgets pending and last-seen labels, all before this
    /// call returns.
    pub fn toggle_camera(&self) -> bool {
        let inner = &self.inner;
        let mut state = inner.state();
        if state.camera.on {
            if let Some(task) = state.sampler_task.take() {
                task.abort();
            }
            state.sampler.reset();
            inner.stop_narration(&mut state);
            inner.overlay.clear();
            state.pending.clear();
            state.change.reset();
            state.camera.on = false;
        } else {
            state.camera.on = true;
            let period = state.interval_ms;
            state.sampler_task = Some(sampling::spawn_timer(inner, period));
        }
        let on = state.camera.on;
        inner.emit(AppEvent::CameraChanged { on });
        on
    }

    /// Switch narration on or off. Returns whether narration is now active.
    ///
    /// Activation is rejected on platforms without narration support, while
    /// the camera is off, and when the system cannot synthesize speech.
    pub async fn toggle_narration(&self) -> Result<bool> {
        let inner = &self.inner;
        {
            let mut state = inner.state();
            if state.narration.is_active() {
                inner.stop_narration(&mut state);
                return Ok(false);
            }
            // Pressed again while voices load: the pending activation is off
            if state.activating {
                state.activating = false;
                state.generation += 1;
                return Ok(false);
            }
        }

        if !inner.platform.supports_narration() {
            return Err(inner.reject(Alert::NarrationUnsupported));
        }
        if !inner.state().camera.on {
            return Err(inner.reject(Alert::CameraInactive));
        }
        if !inner.speech.is_supported() {
            return Err(inner.reject(Alert::SpeechUnavailable));
        }
        if !inner.speech.is_loaded() {
            let generation = {
                let mut state = inner.state();
                state.activating = true;
                state.generation
            };
            let loaded = inner.speech.load_voices(inner.voice_poll, inner.voice_wait).await;
            {
                let mut state = inner.state();
                if state.generation != generation {
                    log::debug!("Narration activation cancelled while loading voices");
                    return Ok(false);
                }
                state.activating = false;
            }
            match loaded {
                Ok(count) => log::debug!("{count} voices available"),
                Err(e) => {
                    inner.emit(AppEvent::SpeechFailed {
                        message: e.to_string(),
                    });
                    return Err(e);
                }
            }
        }

        // The camera may have gone off, or another toggle won, while the
        // voices were loading
        let mut state = inner.state();
        if !state.camera.on {
            drop(state);
            return Err(inner.reject(Alert::CameraInactive));
        }
        if state.narration.is_active() {
            return Ok(true);
        }
        state.generation += 1;
        state.narration = NarrationState::Waiting;
        let generation = state.generation;
        state.narration_task = Some(narrator::spawn_loop(inner, generation));
        inner.emit(AppEvent::NarrationChanged { active: true });
        Ok(true)
    }

    /// Flip between the front and back camera.
    pub fn switch_facing(&self) -> Result<FacingMode> {
        let inner = &self.inner;
        let mut state = inner.state();
        if !state.camera.on {
            drop(state);
            return Err(inner.reject(Alert::CameraInactive));
        }
        let facing = state.camera.facing.flipped();
        state.camera.facing = facing;
        // The new stream has to deliver a frame before detection resumes
        state.sampler.reset();
        inner.source.set_facing(facing);
        inner.emit(AppEvent::FacingChanged { facing });
        Ok(facing)
    }

    /// Change the sampler period. A running sampler is restarted with it.
    pub fn set_detection_interval(&self, interval_ms: u32) -> Result<()> {
        if interval_ms > defaults::MAX_DETECTION_FREQUENCY_MS {
            return Err(ScannerError::DetectionFrequencyOutOfRange {
                value: interval_ms,
                max: defaults::MAX_DETECTION_FREQUENCY_MS,
            });
        }
        let inner = &self.inner;
        let mut state = inner.state();
        state.interval_ms = interval_ms;
        if state.camera.on {
            if let Some(task) = state.sampler_task.take() {
                task.abort();
            }
            state.sampler_task = Some(sampling::spawn_timer(inner, interval_ms));
        }
        inner.emit(AppEvent::IntervalChanged { interval_ms });
        Ok(())
    }

    /// Run one sampler tick now.
    pub async fn tick(&self) -> SampleOutcome {
        sampling::tick(&self.inner).await
    }

    pub fn model_status(&self) -> ModelStatus {
        self.inner.state().model_status
    }

    pub fn camera(&self) -> CameraState {
        self.inner.state().camera
    }

    pub fn narration_state(&self) -> NarrationState {
        self.inner.state().narration
    }

    pub fn pending_labels(&self) -> Vec<String> {
        self.inner.state().pending.as_slice().to_vec()
    }

    /// Labels seen this session, deduplicated.
    pub fn history(&self) -> Vec<String> {
        self.inner.state().history.labels().to_vec()
    }

    pub fn detection_interval(&self) -> u32 {
        self.inner.state().interval_ms
    }

    pub fn is_video_ready(&self) -> bool {
        self.inner.state().sampler.is_video_ready()
    }

    /// Narration loop tasks that have not finished yet.
    pub fn live_narration_loops(&self) -> usize {
        self.inner.live_loops.load(Ordering::SeqCst)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    pub fn locale(&self) -> &str {
        self.inner.speech.locale()
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        let mut state = self.inner.state();
        if let Some(task) = state.sampler_task.take() {
            task.abort();
        }
        if let Some(task) = state.narration_task.take() {
            task.abort();
        }
    }
}
