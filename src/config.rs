use crate::camera::FacingMode;
use crate::defaults;
use crate::error::{Result, ScannerError};
use crate::i18n::{locale_from_env, normalize_locale};
use crate::speech::Prosody;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub sampler: SamplerConfig,
    pub speech: SpeechConfig,
    pub camera: CameraConfig,
    pub store: StoreConfig,
}

/// Frame sampler configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SamplerConfig {
    /// Detection period in milliseconds (0..=2000).
    pub interval_ms: u32,
    /// Skip a tick while the previous detector call is still running.
    pub skip_if_busy: bool,
}

/// Narration voice configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeechConfig {
    /// BCP 47 tag. Taken from the environment when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub voice_wait_ms: u64,
}

/// Camera and overlay configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub facing: FacingMode,
    pub display_width: f32,
    pub display_height: f32,
}

/// Settings store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct StoreConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval_ms: defaults::DETECTION_FREQUENCY_MS,
            skip_if_busy: true,
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            locale: None,
            rate: defaults::SPEECH_RATE,
            pitch: defaults::SPEECH_PITCH,
            volume: defaults::SPEECH_VOLUME,
            voice_wait_ms: defaults::VOICE_WAIT_MS,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            facing: FacingMode::default(),
            display_width: defaults::DISPLAY_WIDTH,
            display_height: defaults::DISPLAY_HEIGHT,
        }
    }
}

impl SpeechConfig {
    /// Configured locale, else the environment's, else `en-US`.
    pub fn resolved_locale(&self) -> String {
        self.locale
            .as_deref()
            .map(normalize_locale)
            .filter(|l| !l.is_empty())
            .or_else(locale_from_env)
            .unwrap_or_else(|| defaults::DEFAULT_LOCALE.to_string())
    }

    pub fn prosody(&self) -> Prosody {
        Prosody {
            rate: self.rate,
            pitch: self.pitch,
            volume: self.volume,
        }
    }
}

impl StoreConfig {
    /// Configured store directory, else `$XDG_DATA_HOME/scannercam/store`.
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("scannercam")
                .join("store")
        })
    }
}

fn invalid(key: &str, message: String) -> ScannerError {
    ScannerError::ConfigInvalidValue {
        key: key.to_string(),
        message,
    }
}

fn check_range(key: &str, value: f32, min: f32, max: f32) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(invalid(key, format!("{value} is outside {min}..={max}")))
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScannerError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                ScannerError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(ScannerError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - SCANNERCAM_INTERVAL_MS → sampler.interval_ms
    /// - SCANNERCAM_LOCALE → speech.locale
    /// - SCANNERCAM_FACING → camera.facing
    /// - SCANNERCAM_STORE → store.path
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(interval) = std::env::var("SCANNERCAM_INTERVAL_MS")
            && !interval.is_empty()
        {
            self.sampler.interval_ms = interval.trim().parse().map_err(|e| {
                invalid("SCANNERCAM_INTERVAL_MS", format!("'{interval}': {e}"))
            })?;
        }

        if let Ok(locale) = std::env::var("SCANNERCAM_LOCALE")
            && !locale.is_empty()
        {
            self.speech.locale = Some(locale);
        }

        if let Ok(facing) = std::env::var("SCANNERCAM_FACING")
            && !facing.is_empty()
        {
            self.camera.facing = facing
                .parse()
                .map_err(|e: String| invalid("SCANNERCAM_FACING", e))?;
        }

        if let Ok(store) = std::env::var("SCANNERCAM_STORE")
            && !store.is_empty()
        {
            self.store.path = Some(PathBuf::from(store));
        }

        Ok(self)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.sampler.interval_ms > defaults::MAX_DETECTION_FREQUENCY_MS {
            return Err(invalid(
                "sampler.interval_ms",
                format!(
                    "{} is outside 0..={}",
                    self.sampler.interval_ms,
                    defaults::MAX_DETECTION_FREQUENCY_MS
                ),
            ));
        }
        check_range("speech.rate", self.speech.rate, 0.1, 10.0)?;
        check_range("speech.pitch", self.speech.pitch, 0.0, 2.0)?;
        check_range("speech.volume", self.speech.volume, 0.0, 1.0)?;
        if self.camera.display_width <= 0.0 || self.camera.display_height <= 0.0 {
            return Err(invalid(
                "camera.display_width",
                "display size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ScannerError::Other(e.to_string()))
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/scannercam/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("scannercam")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_scannercam_env() {
        remove_env("SCANNERCAM_INTERVAL_MS");
        remove_env("SCANNERCAM_LOCALE");
        remove_env("SCANNERCAM_FACING");
        remove_env("SCANNERCAM_STORE");
    }

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        temp_file
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(config.sampler.interval_ms, 200);
        assert!(config.sampler.skip_if_busy);

        assert_eq!(config.speech.locale, None);
        assert_eq!(config.speech.rate, 1.0);
        assert_eq!(config.speech.pitch, 0.8);
        assert_eq!(config.speech.volume, 1.0);
        assert_eq!(config.speech.voice_wait_ms, 3000);

        assert_eq!(config.camera.facing, FacingMode::User);
        assert_eq!(config.camera.display_width, 640.0);
        assert_eq!(config.store.path, None);
        config.validate().unwrap();
    }

    #[test]
    fn test_load_from_toml_file() {
        let temp_file = write_temp(
            r#"
            [sampler]
            interval_ms = 500
            skip_if_busy = false

            [speech]
            locale = "es-ES"
            rate = 1.5
            pitch = 1.0
            volume = 0.5
            voice_wait_ms = 1000

            [camera]
            facing = "environment"
            display_width = 1280.0
            display_height = 720.0

            [store]
            path = "/tmp/scannercam-store"
        "#,
        );

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.sampler.interval_ms, 500);
        assert!(!config.sampler.skip_if_busy);
        assert_eq!(config.speech.locale.as_deref(), Some("es-ES"));
        assert_eq!(config.speech.prosody().rate, 1.5);
        assert_eq!(config.speech.voice_wait_ms, 1000);
        assert_eq!(config.camera.facing, FacingMode::Environment);
        assert_eq!(config.camera.display_height, 720.0);
        assert_eq!(
            config.store.resolved_path(),
            PathBuf::from("/tmp/scannercam-store")
        );
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let temp_file = write_temp(
            r#"
            [sampler]
            interval_ms = 0
        "#,
        );

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.sampler.interval_ms, 0);
        assert!(config.sampler.skip_if_busy);
        assert_eq!(config.speech, SpeechConfig::default());
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn test_env_override_interval() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_scannercam_env();

        set_env("SCANNERCAM_INTERVAL_MS", "750");
        let config = Config::default().with_env_overrides().unwrap();

        assert_eq!(config.sampler.interval_ms, 750);
        assert_eq!(config.speech.locale, None); // Not overridden

        clear_scannercam_env();
    }

    #[test]
    fn test_env_override_all() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_scannercam_env();

        set_env("SCANNERCAM_INTERVAL_MS", "100");
        set_env("SCANNERCAM_LOCALE", "es_MX.UTF-8");
        set_env("SCANNERCAM_FACING", "back");
        set_env("SCANNERCAM_STORE", "/var/tmp/docs");

        let config = Config::default().with_env_overrides().unwrap();

        assert_eq!(config.sampler.interval_ms, 100);
        assert_eq!(config.speech.resolved_locale(), "es-MX");
        assert_eq!(config.camera.facing, FacingMode::Environment);
        assert_eq!(config.store.path, Some(PathBuf::from("/var/tmp/docs")));

        clear_scannercam_env();
    }

    #[test]
    fn test_env_override_empty_string_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_scannercam_env();

        set_env("SCANNERCAM_INTERVAL_MS", "");
        set_env("SCANNERCAM_LOCALE", "");
        let config = Config::default().with_env_overrides().unwrap();

        assert_eq!(config, Config::default());

        clear_scannercam_env();
    }

    #[test]
    fn test_env_override_invalid_values() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_scannercam_env();

        set_env("SCANNERCAM_INTERVAL_MS", "fast");
        let err = Config::default().with_env_overrides().unwrap_err();
        assert!(matches!(
            err,
            ScannerError::ConfigInvalidValue { ref key, .. } if key == "SCANNERCAM_INTERVAL_MS"
        ));
        clear_scannercam_env();

        set_env("SCANNERCAM_FACING", "sideways");
        assert!(Config::default().with_env_overrides().is_err());

        clear_scannercam_env();
    }

    #[test]
    fn test_resolved_locale_prefers_config() {
        let config = SpeechConfig {
            locale: Some("en_GB".to_string()),
            ..SpeechConfig::default()
        };
        assert_eq!(config.resolved_locale(), "en-GB");
    }

    #[test]
    fn test_resolved_locale_from_environment() {
        let _lock = ENV_LOCK.lock().unwrap();
        let saved: Vec<_> = ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .map(|k| (*k, std::env::var(k).ok()))
            .collect();

        remove_env("LC_ALL");
        remove_env("LC_MESSAGES");
        set_env("LANG", "es_ES.UTF-8");
        assert_eq!(SpeechConfig::default().resolved_locale(), "es-ES");

        set_env("LANG", "C");
        assert_eq!(SpeechConfig::default().resolved_locale(), "en-US");

        for (key, value) in saved {
            match value {
                Some(v) => set_env(key, &v),
                None => remove_env(key),
            }
        }
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config = Config::default();
        config.sampler.interval_ms = 2001;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sampler.interval_ms = 2000;
        config.validate().unwrap();

        let mut config = Config::default();
        config.speech.volume = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("speech.volume"));

        let mut config = Config::default();
        config.speech.rate = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.camera.display_height = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let temp_file = write_temp(
            r#"
            [sampler
            interval_ms = "broken
        "#,
        );

        let result = Config::load(temp_file.path());

        assert!(matches!(result, Err(ScannerError::Config(_))));
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let temp_file = write_temp("[camera]\nfacing = \"sideways\"\n");
        assert!(Config::load(temp_file.path()).is_err());
    }

    #[test]
    fn test_default_path_ends_with_app_dir() {
        let path = Config::default_path();
        assert!(path.ends_with("scannercam/config.toml"));
    }

    #[test]
    fn test_load_or_default_returns_default_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("missing.toml")).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_fails_on_invalid_toml() {
        let temp_file = write_temp("[sampler\n");
        assert!(Config::load_or_default(temp_file.path()).is_err());
    }

    #[test]
    fn test_toml_round_trip_of_defaults() {
        let rendered = Config::default().to_toml().unwrap();
        assert!(rendered.contains("[sampler]"));
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, Config::default());
    }
}
