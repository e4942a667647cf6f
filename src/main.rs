use anyhow::Result;
use clap::{CommandFactory, Parser};
use env_logger::Env;
use owo_colors::OwoColorize;
use scannercam::app::{RunOptions, list_voices, run_command, settings_get, settings_set};
use scannercam::cli::{Cli, Commands, ConfigAction, SettingsAction};
use scannercam::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Run {
            script,
            narrate,
            seconds,
            user,
            print_speech,
            looping,
            locale,
            interval,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let options = RunOptions {
                script,
                narrate,
                seconds,
                user,
                print_speech,
                looping,
                locale,
                interval_ms: interval,
                quiet: cli.quiet,
            };
            if let Err(e) = run_command(config, options).await {
                eprintln!("{}", format!("Error: {e}").red());
                std::process::exit(1);
            }
        }
        Commands::Voices { locale } => {
            let config = load_config(cli.config.as_deref())?;
            list_voices(&config, locale.as_deref()).await?;
        }
        Commands::Settings { action } => {
            let config = load_config(cli.config.as_deref())?;
            match action {
                SettingsAction::Get { user } => {
                    let ms = settings_get(&config, &user).await?;
                    println!("{}", ms);
                }
                SettingsAction::Set { user, ms } => {
                    settings_set(&config, &user, ms, cli.quiet).await?;
                    if cli.quiet {
                        println!("{}", format!("{user}: {ms}ms").green());
                    }
                }
            }
        }
        Commands::Config { action } => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "scannercam", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Default level from the flags; `RUST_LOG` still wins.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(level));
    builder.format_timestamp_millis();
    if builder.try_init().is_err() {
        eprintln!("Logger already initialized");
    }
}

/// Load configuration from file and environment.
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };
    Ok(config.with_env_overrides()?)
}

fn handle_config_command(
    action: ConfigAction,
    custom_path: Option<&std::path::Path>,
) -> Result<()> {
    match action {
        ConfigAction::Path => {
            let path = custom_path
                .map(std::path::PathBuf::from)
                .unwrap_or_else(Config::default_path);
            let marker = if path.exists() {
                "exists".green().to_string()
            } else {
                "not created".dimmed().to_string()
            };
            println!("{} ({})", path.display(), marker);
        }
        ConfigAction::Show => {
            let config = load_config(custom_path)?;
            print!("{}", config.to_toml()?);
        }
    }
    Ok(())
}
