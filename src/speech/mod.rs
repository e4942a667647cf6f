//! Speech output: synthesizer backends, voice lookup and the narration
//! channel.

pub mod channel;
pub mod espeak;
pub mod print;
pub mod synth;
pub mod voices;

pub use channel::SpeechChannel;
pub use espeak::{CommandExecutor, EspeakSynthesizer, SystemCommandExecutor};
pub use print::PrintSynthesizer;
pub use synth::{MockSynthesizer, OnEnd, Prosody, SpeechSynthesizer, SynthCall, Utterance, Voice};
pub use voices::{VoiceRegistry, wait_for_voices};
