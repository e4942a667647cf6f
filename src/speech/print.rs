use crate::error::Result;
use crate::speech::synth::{SpeechSynthesizer, Utterance, Voice};
use std::io::Write;

/// Writes utterances to stdout instead of playing them.
///
/// Offers a single voice for the configured locale, so narration works on
/// machines without a speech engine.
#[derive(Debug, Clone)]
pub struct PrintSynthesizer {
    voice: Voice,
}

impl PrintSynthesizer {
    pub fn new(locale: &str) -> Self {
        Self {
            voice: Voice::new("stdout", locale),
        }
    }
}

impl SpeechSynthesizer for PrintSynthesizer {
    fn is_supported(&self) -> bool {
        true
    }

    fn voices(&self) -> Vec<Voice> {
        vec![self.voice.clone()]
    }

    fn speak(&self, utterance: Utterance) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", utterance.text)?;
        stdout.flush()?;
        drop(stdout);
        if let Some(on_end) = utterance.on_end {
            on_end();
        }
        Ok(())
    }

    fn cancel_all(&self) {}
}
