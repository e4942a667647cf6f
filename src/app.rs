//! Command handlers wiring the library together.
//!
//! `run` builds the full detection loop: scripted detector → sampler →
//! change detector → narration → speech, with events printed on stderr.

use crate::account::Account;
use crate::camera::{FacingMode, SyntheticSource};
use crate::config::Config;
use crate::controller::{Controller, ControllerConfig};
use crate::defaults;
use crate::error::{Result, ScannerError};
use crate::events::{ChannelSink, EventSink, LogSink};
use crate::i18n::{Catalog, normalize_locale};
use crate::output::render_event;
use crate::speech::{EspeakSynthesizer, PrintSynthesizer, SpeechSynthesizer, wait_for_voices};
use crate::store::{JsonFileStore, SettingsStore};
use crate::vision::{Connectivity, TcpProbe};
use crate::vision::detector::ScriptLoader;
use crate::vision::overlay::TerminalOverlay;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Options of the `run` command.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub script: PathBuf,
    pub narrate: bool,
    /// Stop after this many seconds; `None` runs until Ctrl-C.
    pub seconds: Option<u64>,
    pub user: Option<String>,
    pub print_speech: bool,
    pub looping: bool,
    pub locale: Option<String>,
    pub interval_ms: Option<u32>,
    pub quiet: bool,
}

/// Prints events from a channel on a dedicated thread.
///
/// The thread exits once every sender is dropped.
struct EventPrinter {
    sink: Arc<dyn EventSink>,
    thread: Option<JoinHandle<()>>,
}

impl EventPrinter {
    fn new(quiet: bool) -> Self {
        if quiet {
            return Self {
                sink: Arc::new(LogSink),
                thread: None,
            };
        }
        let (sink, rx) = ChannelSink::bounded(defaults::EVENT_BUFFER);
        let thread = std::thread::spawn(move || {
            for event in rx.iter() {
                render_event(&event);
            }
        });
        Self {
            sink: Arc::new(sink),
            thread: Some(thread),
        }
    }

    fn sink(&self) -> Arc<dyn EventSink> {
        Arc::clone(&self.sink)
    }

    /// Drop our sender and wait until everything queued is printed.
    fn finish(self) {
        let Self { sink, thread } = self;
        drop(sink);
        if let Some(thread) = thread
            && thread.join().is_err()
        {
            log::warn!("Event printer thread panicked");
        }
    }
}

fn synthesizer(print_speech: bool, locale: &str) -> Arc<dyn SpeechSynthesizer> {
    if print_speech {
        Arc::new(PrintSynthesizer::new(locale))
    } else {
        Arc::new(EspeakSynthesizer::system())
    }
}

fn open_store(config: &Config) -> Arc<dyn SettingsStore> {
    let path = config.store.resolved_path();
    log::debug!("Settings store at {}", path.display());
    Arc::new(JsonFileStore::new(path))
}

/// Run the detection loop against a scripted detection feed.
pub async fn run_command(config: Config, options: RunOptions) -> Result<()> {
    run_with(config, options, Arc::new(TcpProbe::default())).await
}

async fn run_with(
    mut config: Config,
    options: RunOptions,
    connectivity: Arc<dyn Connectivity>,
) -> Result<()> {
    if let Some(locale) = &options.locale {
        config.speech.locale = Some(normalize_locale(locale));
    }
    if let Some(ms) = options.interval_ms {
        config.sampler.interval_ms = ms;
    }
    config.validate()?;
    log::info!("scannercam {}", crate::version_string());

    let printer = EventPrinter::new(options.quiet);
    let (controller, account) =
        match open_session(&config, &options, connectivity, printer.sink()).await {
            Ok(session) => session,
            Err(e) => {
                printer.finish();
                return Err(e);
            }
        };

    let result = drive(&controller, &config, &options).await;

    if let Some(account) = &account {
        match account.dashboard(&controller).await {
            Ok(dashboard) => log::info!(
                "Session detections for {}: {}",
                dashboard.account_id,
                dashboard.detections.join(", ")
            ),
            Err(e) => log::warn!("Could not read dashboard: {e}"),
        }
    }

    drop(account);
    drop(controller);
    printer.finish();
    result
}

/// Build the controller and sign the user in, if one was given.
///
/// An explicit `--interval` wins over the user's stored frequency.
async fn open_session(
    config: &Config,
    options: &RunOptions,
    connectivity: Arc<dyn Connectivity>,
    events: Arc<dyn EventSink>,
) -> Result<(Controller, Option<Account>)> {
    let controller_config = ControllerConfig::from_config(config);
    let locale = controller_config.locale.clone();
    let catalog = Catalog::for_locale(&locale)?;

    let display = (config.camera.display_width, config.camera.display_height);
    // Frame size is irrelevant to a scripted feed; match the display
    let source = Arc::new(SyntheticSource::ready(
        display.0 as u32,
        display.1 as u32,
        display,
    ));

    let controller = Controller::builder(
        Arc::new(ScriptLoader::new(options.script.clone(), options.looping)),
        source,
        synthesizer(options.print_speech, &locale),
    )
    .config(controller_config)
    .overlay(Arc::new(TerminalOverlay::new()))
    .connectivity(connectivity)
    .events(Arc::clone(&events))
    .catalog(catalog.clone())
    .build()?;

    let account = match &options.user {
        Some(uid) => {
            let account = Account::sign_in(uid, open_store(config), events, catalog).await?;
            match options.interval_ms {
                Some(ms) => log::info!("Using detection frequency {ms}ms from --interval"),
                None => {
                    let ms = account.apply_to(&controller).await?;
                    log::info!("Using detection frequency {ms}ms from user {uid}");
                }
            }
            Some(account)
        }
        None => None,
    };

    Ok((controller, account))
}

async fn drive(controller: &Controller, config: &Config, options: &RunOptions) -> Result<()> {
    controller.start().await?;

    controller.toggle_camera();
    if config.camera.facing != FacingMode::default() {
        controller.switch_facing()?;
    }

    if options.narrate {
        controller.toggle_narration().await?;
    }

    match options.seconds {
        Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
        None => tokio::signal::ctrl_c().await?,
    }

    if controller.camera().on {
        controller.toggle_camera();
    }
    Ok(())
}

/// List synthesizer voices, optionally only those for one locale.
pub async fn list_voices(config: &Config, locale: Option<&str>) -> Result<()> {
    let synth = EspeakSynthesizer::system();
    let voices = wait_for_voices(
        &synth,
        Duration::from_millis(defaults::VOICE_POLL_MS),
        Duration::from_millis(config.speech.voice_wait_ms),
    )
    .await?;

    let wanted = locale.map(normalize_locale);
    let mut shown = 0;
    for voice in voices
        .iter()
        .filter(|v| wanted.as_ref().is_none_or(|l| &v.lang == l))
    {
        println!("{:<8} {}", voice.lang, voice.name);
        shown += 1;
    }

    if shown == 0
        && let Some(locale) = wanted
    {
        return Err(ScannerError::NoVoiceForLocale { locale });
    }
    Ok(())
}

/// Read a user's stored detection frequency; the default for unknown users.
pub async fn settings_get(config: &Config, uid: &str) -> Result<u32> {
    open_store(config).get_detection_frequency(uid).await
}

/// Save a user's detection frequency, creating the user when needed.
pub async fn settings_set(config: &Config, uid: &str, ms: u32, quiet: bool) -> Result<()> {
    let catalog = Catalog::for_locale(&config.speech.resolved_locale())?;
    let printer = EventPrinter::new(quiet);
    let account = Account::sign_in(uid, open_store(config), printer.sink(), catalog).await?;
    let result = account.save_frequency(ms).await;
    drop(account);
    printer.finish();
    result
}
