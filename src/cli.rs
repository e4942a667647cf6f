//! Command-line interface for scannercam
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Real-time object recognition with spoken narration
#[derive(Parser, Debug)]
#[command(
    name = "scannercam",
    version,
    about = "Real-time object recognition with spoken narration"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress event output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: info logs, -vv: debug logs)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the detection loop against a recorded detection feed
    Run {
        /// JSON feed: one array of detections per sampler tick
        #[arg(long, value_name = "FILE")]
        script: PathBuf,

        /// Turn narration on once the camera is running
        #[arg(long)]
        narrate: bool,

        /// Stop after this long (default: run until Ctrl-C). Examples: 30, 45s, 2m
        #[arg(long, value_name = "DURATION", value_parser = parse_duration_secs)]
        seconds: Option<u64>,

        /// Sign in as this user and use their detection frequency
        #[arg(long, value_name = "UID")]
        user: Option<String>,

        /// Print narration to stdout instead of speaking it
        #[arg(long)]
        print_speech: bool,

        /// Restart the feed from the beginning when it runs out
        #[arg(long = "loop")]
        looping: bool,

        /// Narration locale override (e.g. en-US, es-ES)
        #[arg(long, value_name = "TAG")]
        locale: Option<String>,

        /// Sampler interval override in milliseconds (0-2000)
        #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u32).range(0..=2000))]
        interval: Option<u32>,
    },

    /// List speech synthesizer voices
    Voices {
        /// Only voices whose language tag equals this locale
        #[arg(long, value_name = "TAG")]
        locale: Option<String>,
    },

    /// Per-user dashboard settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Dashboard settings actions
#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Show a user's detection frequency
    Get {
        #[arg(long, value_name = "UID")]
        user: String,
    },

    /// Save a user's detection frequency
    Set {
        #[arg(long, value_name = "UID")]
        user: String,

        /// Detection frequency in milliseconds (0-2000)
        #[arg(value_name = "MS")]
        ms: u32,
    },
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the configuration file path
    Path,

    /// Print the effective configuration (file + environment) as TOML
    Show,
}

/// Parse a duration string into seconds.
///
/// Supports any duration format accepted by `humantime`: bare numbers (seconds),
/// single-unit (`30s`, `5m`, `2h`), and compound (`1h30m`, `2m30s`).
fn parse_duration_secs(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(secs);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_secs())
        .map_err(|e| e.to_string())
}
