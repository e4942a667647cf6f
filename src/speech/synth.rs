use crate::defaults;
use crate::error::{Result, ScannerError};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

/// A synthesizer voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    /// BCP 47 language tag, e.g. `en-US`.
    pub lang: String,
}

impl Voice {
    pub fn new(name: &str, lang: &str) -> Self {
        Self {
            name: name.to_string(),
            lang: lang.to_string(),
        }
    }
}

/// Rate, pitch and volume of an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prosody {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for Prosody {
    fn default() -> Self {
        Self {
            rate: defaults::SPEECH_RATE,
            pitch: defaults::SPEECH_PITCH,
            volume: defaults::SPEECH_VOLUME,
        }
    }
}

/// Callback run when an utterance finishes playing.
pub type OnEnd = Box<dyn FnOnce() + Send>;

/// One speech request.
pub struct Utterance {
    pub voice: Voice,
    pub text: String,
    pub lang: String,
    pub prosody: Prosody,
    pub on_end: Option<OnEnd>,
}

impl std::fmt::Debug for Utterance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Utterance")
            .field("voice", &self.voice)
            .field("text", &self.text)
            .field("lang", &self.lang)
            .field("prosody", &self.prosody)
            .field("on_end", &self.on_end.is_some())
            .finish()
    }
}

/// Trait for speech output.
///
/// `speak` must not block until playback ends; playback runs in the
/// background and `cancel_all` stops it.
pub trait SpeechSynthesizer: Send + Sync {
    /// Whether this system can synthesize speech at all.
    fn is_supported(&self) -> bool;

    /// All voices currently known. May be empty until the engine is ready.
    fn voices(&self) -> Vec<Voice>;

    /// Start speaking an utterance.
    fn speak(&self, utterance: Utterance) -> Result<()>;

    /// Stop anything playing or queued.
    fn cancel_all(&self);
}

impl<T: SpeechSynthesizer> SpeechSynthesizer for Arc<T> {
    fn is_supported(&self) -> bool {
        (**self).is_supported()
    }

    fn voices(&self) -> Vec<Voice> {
        (**self).voices()
    }

    fn speak(&self, utterance: Utterance) -> Result<()> {
        (**self).speak(utterance)
    }

    fn cancel_all(&self) {
        (**self).cancel_all()
    }
}

/// What a [`MockSynthesizer`] saw, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthCall {
    Speak {
        text: String,
        voice: String,
        lang: String,
        prosody: Prosody,
    },
    Cancel,
}

/// Mock synthesizer for testing
///
/// Records every call. Voices can be made to appear late to exercise the
/// polling path.
#[derive(Debug)]
pub struct MockSynthesizer {
    supported: bool,
    voices: Mutex<Vec<Voice>>,
    calls: Mutex<Vec<SynthCall>>,
    should_fail: bool,
}

impl MockSynthesizer {
    pub fn new(voices: Vec<Voice>) -> Self {
        Self {
            supported: true,
            voices: Mutex::new(voices),
            calls: Mutex::new(Vec::new()),
            should_fail: false,
        }
    }

    /// A synthesizer with one voice for each given locale.
    pub fn with_locales(locales: &[&str]) -> Self {
        Self::new(
            locales
                .iter()
                .map(|l| Voice::new(&format!("mock-{l}"), l))
                .collect(),
        )
    }

    /// A system without speech synthesis.
    pub fn unsupported() -> Self {
        let mut synth = Self::new(Vec::new());
        synth.supported = false;
        synth
    }

    /// Configure the mock to fail on speak
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    pub fn set_voices(&self, voices: Vec<Voice>) {
        *self.voices.lock().unwrap_or_else(PoisonError::into_inner) = voices;
    }

    pub fn calls(&self) -> Vec<SynthCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Texts of all speak calls.
    pub fn spoken(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SynthCall::Speak { text, .. } => Some(text),
                SynthCall::Cancel => None,
            })
            .collect()
    }

    fn record(&self, call: SynthCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl SpeechSynthesizer for MockSynthesizer {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn voices(&self) -> Vec<Voice> {
        self.voices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn speak(&self, utterance: Utterance) -> Result<()> {
        if self.should_fail {
            return Err(ScannerError::SpeechFailed {
                message: "mock speech failure".to_string(),
            });
        }
        self.record(SynthCall::Speak {
            text: utterance.text,
            voice: utterance.voice.name,
            lang: utterance.lang,
            prosody: utterance.prosody,
        });
        if let Some(on_end) = utterance.on_end {
            on_end();
        }
        Ok(())
    }

    fn cancel_all(&self) {
        self.record(SynthCall::Cancel);
    }
}
