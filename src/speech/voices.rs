//! Voice discovery and the per-locale voice cache.
//!
//! Engines do not always know their voices at startup, so callers poll
//! until the list is non-empty. Once a locale has been resolved, the result
//! is kept for the rest of the session.

use crate::error::{Result, ScannerError};
use crate::speech::synth::{SpeechSynthesizer, Voice};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct VoiceRegistry {
    all: Option<Vec<Voice>>,
    by_locale: HashMap<String, Vec<Voice>>,
}

impl VoiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.all.is_some()
    }

    /// Store a voice list. Empty lists are ignored.
    pub fn set_voices(&mut self, voices: Vec<Voice>) -> bool {
        if voices.is_empty() {
            return false;
        }
        self.all = Some(voices);
        true
    }

    /// Ask the synthesizer again if nothing has been loaded yet.
    pub fn refresh(&mut self, synth: &dyn SpeechSynthesizer) -> bool {
        self.is_loaded() || self.set_voices(synth.voices())
    }

    /// Voices whose language tag equals `locale` exactly.
    pub fn voices_for(
        &mut self,
        synth: &dyn SpeechSynthesizer,
        locale: &str,
    ) -> Result<Vec<Voice>> {
        if !synth.is_supported() {
            return Err(ScannerError::SpeechUnsupported);
        }
        let no_voice = || ScannerError::NoVoiceForLocale {
            locale: locale.to_string(),
        };

        if let Some(cached) = self.by_locale.get(locale) {
            return if cached.is_empty() {
                Err(no_voice())
            } else {
                Ok(cached.clone())
            };
        }

        if !self.refresh(synth) {
            // Not cached: the engine may still come up
            return Err(no_voice());
        }
        let matching: Vec<Voice> = self
            .all
            .iter()
            .flatten()
            .filter(|v| v.lang == locale)
            .cloned()
            .collect();
        self.by_locale.insert(locale.to_string(), matching.clone());
        if matching.is_empty() {
            Err(no_voice())
        } else {
            Ok(matching)
        }
    }
}

/// Poll the synthesizer until it reports at least one voice.
///
/// Fails fast when the system has no synthesis capability at all.
pub async fn wait_for_voices(
    synth: &dyn SpeechSynthesizer,
    poll: Duration,
    timeout: Duration,
) -> Result<Vec<Voice>> {
    if !synth.is_supported() {
        return Err(ScannerError::SpeechUnsupported);
    }
    let deadline = Instant::now() + timeout;
    loop {
        let voices = synth.voices();
        if !voices.is_empty() {
            return Ok(voices);
        }
        if Instant::now() >= deadline {
            return Err(ScannerError::SpeechFailed {
                message: format!("no voices became available within {}ms", timeout.as_millis()),
            });
        }
        tokio::time::sleep(poll).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::synth::MockSynthesizer;
    use std::sync::Arc;

    #[test]
    fn test_voices_for_exact_locale_match() {
        let synth = MockSynthesizer::new(vec![
            Voice::new("a", "en-US"),
            Voice::new("b", "en-GB"),
            Voice::new("c", "en-US"),
        ]);
        let mut registry = VoiceRegistry::new();
        let voices = registry.voices_for(&synth, "en-US").unwrap();
        let names: Vec<_> = voices.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["a", "c"]);
    }

    #[test]
    fn test_missing_locale_is_an_error() {
        let synth = MockSynthesizer::with_locales(&["en-US"]);
        let mut registry = VoiceRegistry::new();
        let err = registry.voices_for(&synth, "en").unwrap_err();
        assert!(matches!(err, ScannerError::NoVoiceForLocale { .. }));
    }

    #[test]
    fn test_resolved_locale_is_cached() {
        let synth = MockSynthesizer::with_locales(&["es-ES"]);
        let mut registry = VoiceRegistry::new();
        registry.voices_for(&synth, "es-ES").unwrap();

        // Later changes on the engine side do not affect a cached locale
        synth.set_voices(vec![Voice::new("other", "fr-FR")]);
        assert_eq!(registry.voices_for(&synth, "es-ES").unwrap()[0].name, "mock-es-ES");
    }

    #[test]
    fn test_empty_result_is_cached_too() {
        let synth = MockSynthesizer::with_locales(&["en-US"]);
        let mut registry = VoiceRegistry::new();
        assert!(registry.voices_for(&synth, "de-DE").is_err());
        synth.set_voices(vec![Voice::new("d", "de-DE")]);
        assert!(registry.voices_for(&synth, "de-DE").is_err());
    }

    #[test]
    fn test_unloaded_engine_is_retried() {
        let synth = MockSynthesizer::new(Vec::new());
        let mut registry = VoiceRegistry::new();
        assert!(registry.voices_for(&synth, "en-US").is_err());
        assert!(!registry.is_loaded());

        synth.set_voices(vec![Voice::new("late", "en-US")]);
        assert_eq!(registry.voices_for(&synth, "en-US").unwrap()[0].name, "late");
    }

    #[test]
    fn test_unsupported_engine() {
        let synth = MockSynthesizer::unsupported();
        let mut registry = VoiceRegistry::new();
        assert!(matches!(
            registry.voices_for(&synth, "en-US"),
            Err(ScannerError::SpeechUnsupported)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_voices_polls_until_available() {
        let synth = Arc::new(MockSynthesizer::new(Vec::new()));
        let late = Arc::clone(&synth);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(350)).await;
            late.set_voices(vec![Voice::new("v", "en-US")]);
        });

        let voices = wait_for_voices(
            synth.as_ref(),
            Duration::from_millis(100),
            Duration::from_secs(3),
        )
        .await
        .unwrap();
        assert_eq!(voices.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_voices_times_out() {
        let synth = MockSynthesizer::new(Vec::new());
        let err = wait_for_voices(&synth, Duration::from_millis(100), Duration::from_millis(500))
            .await
            .unwrap_err();
        assert!(matches!(err, ScannerError::SpeechFailed { .. }));
    }

    #[tokio::test]
    async fn test_wait_for_voices_fails_fast_when_unsupported() {
        let synth = MockSynthesizer::unsupported();
        let err = wait_for_voices(&synth, Duration::from_millis(100), Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, ScannerError::SpeechUnsupported));
    }
}
