use crate::error::Result;
use crate::speech::synth::{OnEnd, Prosody, SpeechSynthesizer, Utterance, Voice};
use crate::speech::voices::{VoiceRegistry, wait_for_voices};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Speaks the latest narration in one locale.
///
/// Every request cancels whatever is still playing first, so at most one
/// utterance is ever audible.
pub struct SpeechChannel {
    synth: Arc<dyn SpeechSynthesizer>,
    registry: Mutex<VoiceRegistry>,
    locale: String,
    prosody: Prosody,
}

impl SpeechChannel {
    pub fn new(synth: Arc<dyn SpeechSynthesizer>, locale: &str, prosody: Prosody) -> Self {
        Self {
            synth,
            registry: Mutex::new(VoiceRegistry::new()),
            locale: locale.to_string(),
            prosody,
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn is_supported(&self) -> bool {
        self.synth.is_supported()
    }

    pub fn is_loaded(&self) -> bool {
        self.registry().is_loaded()
    }

    /// Poll the engine until its voices are known. Returns the voice count.
    pub async fn load_voices(&self, poll: Duration, timeout: Duration) -> Result<usize> {
        let voices = wait_for_voices(self.synth.as_ref(), poll, timeout).await?;
        let count = voices.len();
        self.registry().set_voices(voices);
        Ok(count)
    }

    /// Voices for this channel's locale.
    pub fn voices(&self) -> Result<Vec<Voice>> {
        self.registry().voices_for(self.synth.as_ref(), &self.locale)
    }

    /// Cancel anything in flight and speak `text`.
    pub fn announce(&self, text: &str) -> Result<()> {
        self.announce_with(text, None)
    }

    pub fn announce_with(&self, text: &str, on_end: Option<OnEnd>) -> Result<()> {
        let voice = self
            .voices()?
            .into_iter()
            .next()
            .ok_or_else(|| crate::error::ScannerError::NoVoiceForLocale {
                locale: self.locale.clone(),
            })?;
        self.synth.cancel_all();
        self.synth.speak(Utterance {
            voice,
            text: text.to_string(),
            lang: self.locale.clone(),
            prosody: self.prosody,
            on_end,
        })
    }

    pub fn cancel_all(&self) {
        self.synth.cancel_all();
    }

    fn registry(&self) -> MutexGuard<'_, VoiceRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
