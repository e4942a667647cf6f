//! Speech output through the `espeak-ng` command-line synthesizer.
//!
//! Every utterance is a separate `espeak-ng` process. Cancelling kills the
//! process that is currently speaking. The `CommandExecutor` seam keeps the
//! backend testable without the tool installed.

use crate::error::{Result, ScannerError};
use crate::i18n::normalize_locale;
use crate::speech::synth::{OnEnd, Prosody, SpeechSynthesizer, Utterance, Voice};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

pub const ESPEAK: &str = "espeak-ng";

/// espeak-ng's default speaking rate in words per minute.
const BASE_WPM: f32 = 175.0;
const WATCH_INTERVAL: Duration = Duration::from_millis(50);

/// A process started by [`CommandExecutor::spawn`].
pub trait RunningCommand: Send {
    /// True once the process has exited.
    fn is_finished(&mut self) -> bool;

    fn kill(&mut self);
}

/// Trait for executing system commands.
pub trait CommandExecutor: Send + Sync {
    /// Run to completion and return stdout.
    fn execute(&self, command: &str, args: &[&str]) -> Result<String>;

    /// Start a command in the background.
    fn spawn(&self, command: &str, args: &[&str]) -> Result<Box<dyn RunningCommand>>;
}

fn spawn_error(command: &str, e: std::io::Error) -> ScannerError {
    if e.kind() == std::io::ErrorKind::NotFound {
        ScannerError::SpeechToolNotFound {
            tool: command.to_string(),
        }
    } else {
        ScannerError::SpeechFailed {
            message: format!("Failed to execute {command}: {e}"),
        }
    }
}

/// Production command executor using std::process::Command.
#[derive(Debug, Clone, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn execute(&self, command: &str, args: &[&str]) -> Result<String> {
        let output = Command::new(command)
            .args(args)
            .output()
            .map_err(|e| spawn_error(command, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScannerError::SpeechFailed {
                message: format!("{command} failed with status {:?}: {stderr}", output.status),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn spawn(&self, command: &str, args: &[&str]) -> Result<Box<dyn RunningCommand>> {
        let child = Command::new(command)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| spawn_error(command, e))?;
        Ok(Box::new(ChildProcess(child)))
    }
}

struct ChildProcess(Child);

impl RunningCommand for ChildProcess {
    fn is_finished(&mut self) -> bool {
        // An error here means the child can no longer be observed
        !matches!(self.0.try_wait(), Ok(None))
    }

    fn kill(&mut self) {
        if let Err(e) = self.0.kill() {
            log::debug!("espeak-ng process already gone: {e}");
        }
        if let Err(e) = self.0.wait() {
            log::debug!("Failed to reap espeak-ng process: {e}");
        }
    }
}

struct Playback {
    id: u64,
    process: Box<dyn RunningCommand>,
}

#[derive(Default)]
struct PlaybackSlot {
    next_id: u64,
    current: Option<Playback>,
}

/// Synthesizer backed by `espeak-ng`.
pub struct EspeakSynthesizer<E: CommandExecutor> {
    executor: E,
    supported: OnceLock<bool>,
    playback: Arc<Mutex<PlaybackSlot>>,
}

impl EspeakSynthesizer<SystemCommandExecutor> {
    pub fn system() -> Self {
        Self::new(SystemCommandExecutor)
    }
}

impl<E: CommandExecutor> EspeakSynthesizer<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            supported: OnceLock::new(),
            playback: Arc::new(Mutex::new(PlaybackSlot::default())),
        }
    }

    fn slot(&self) -> MutexGuard<'_, PlaybackSlot> {
        self.playback.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn watch(&self, id: u64, on_end: OnEnd) {
        let playback = Arc::clone(&self.playback);
        std::thread::spawn(move || {
            loop {
                std::thread::sleep(WATCH_INTERVAL);
                let mut slot = playback.lock().unwrap_or_else(PoisonError::into_inner);
                match slot.current.as_mut() {
                    Some(p) if p.id == id => {
                        if p.process.is_finished() {
                            slot.current = None;
                            drop(slot);
                            on_end();
                            return;
                        }
                    }
                    // Cancelled or replaced
                    _ => return,
                }
            }
        });
    }
}

/// espeak-ng arguments for an utterance.
pub fn espeak_args(utterance: &Utterance) -> Vec<String> {
    let Prosody {
        rate,
        pitch,
        volume,
    } = utterance.prosody;
    let wpm = (rate * BASE_WPM).round().clamp(80.0, 450.0) as u32;
    let pitch = (pitch * 50.0).round().clamp(0.0, 99.0) as u32;
    let amplitude = (volume * 100.0).round().clamp(0.0, 200.0) as u32;
    vec![
        "-v".to_string(),
        utterance.voice.lang.to_ascii_lowercase(),
        "-s".to_string(),
        wpm.to_string(),
        "-p".to_string(),
        pitch.to_string(),
        "-a".to_string(),
        amplitude.to_string(),
        "--".to_string(),
        utterance.text.clone(),
    ]
}

/// Parse the table printed by `espeak-ng --voices`.
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  en-us           --/M      English_(America)  gmw/en-US            (en 2)
/// ```
pub fn parse_voice_list(output: &str) -> Vec<Voice> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut columns = line.split_whitespace();
            let _priority = columns.next()?;
            let language = columns.next()?;
            let _age_gender = columns.next()?;
            let name = columns.next()?;
            Some(Voice::new(&name.replace('_', " "), &normalize_locale(language)))
        })
        .collect()
}

impl<E: CommandExecutor> SpeechSynthesizer for EspeakSynthesizer<E> {
    fn is_supported(&self) -> bool {
        *self
            .supported
            .get_or_init(|| self.executor.execute(ESPEAK, &["--version"]).is_ok())
    }

    fn voices(&self) -> Vec<Voice> {
        match self.executor.execute(ESPEAK, &["--voices"]) {
            Ok(output) => parse_voice_list(&output),
            Err(e) => {
                log::warn!("Failed to list espeak-ng voices: {e}");
                Vec::new()
            }
        }
    }

    fn speak(&self, utterance: Utterance) -> Result<()> {
        let args = espeak_args(&utterance);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let process = self.executor.spawn(ESPEAK, &args)?;

        let id = {
            let mut slot = self.slot();
            if let Some(mut previous) = slot.current.take() {
                previous.process.kill();
            }
            slot.next_id += 1;
            let id = slot.next_id;
            slot.current = Some(Playback { id, process });
            id
        };
        if let Some(on_end) = utterance.on_end {
            self.watch(id, on_end);
        }
        Ok(())
    }

    fn cancel_all(&self) {
        let previous = self.slot().current.take();
        if let Some(mut playback) = previous {
            playback.process.kill();
        }
    }
}
