//! Per-user settings documents.
//!
//! Each user has one document under `users/<uid>`:
//!
//! ```json
//! { "accountId": "u1", "detections": [], "userConfiguration": { "detectionFrequency": 200 } }
//! ```

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::defaults;
use crate::error::{Result, ScannerError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConfiguration {
    pub detection_frequency: u32,
}

impl Default for UserConfiguration {
    fn default() -> Self {
        Self {
            detection_frequency: defaults::DETECTION_FREQUENCY_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    pub account_id: String,
    #[serde(default)]
    pub detections: Vec<String>,
    #[serde(default)]
    pub user_configuration: UserConfiguration,
}

impl UserDocument {
    /// Document written for a user signing in for the first time.
    pub fn new(uid: &str) -> Self {
        Self {
            account_id: uid.to_string(),
            detections: Vec::new(),
            user_configuration: UserConfiguration::default(),
        }
    }
}

/// Check a detection frequency against the allowed range.
pub fn validate_frequency(ms: u32) -> Result<()> {
    if ms > defaults::MAX_DETECTION_FREQUENCY_MS {
        return Err(ScannerError::DetectionFrequencyOutOfRange {
            value: ms,
            max: defaults::MAX_DETECTION_FREQUENCY_MS,
        });
    }
    Ok(())
}

/// Async document store for user settings.
#[async_trait::async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_user(&self, uid: &str) -> Result<Option<UserDocument>>;

    async fn put_user(&self, document: &UserDocument) -> Result<()>;

    /// Create the user's document unless it already exists.
    async fn ensure_user(&self, uid: &str) -> Result<UserDocument> {
        if let Some(existing) = self.get_user(uid).await? {
            return Ok(existing);
        }
        let document = UserDocument::new(uid);
        self.put_user(&document).await?;
        log::info!("Created settings for user {uid}");
        Ok(document)
    }

    /// Stored frequency, or the default when the user has no document.
    async fn get_detection_frequency(&self, uid: &str) -> Result<u32> {
        Ok(self
            .get_user(uid)
            .await?
            .map_or(defaults::DETECTION_FREQUENCY_MS, |d| {
                d.user_configuration.detection_frequency
            }))
    }

    /// Store a new frequency. The user's document must exist.
    async fn update_detection_frequency(&self, uid: &str, ms: u32) -> Result<()> {
        validate_frequency(ms)?;
        let mut document = self.get_user(uid).await?.ok_or_else(|| ScannerError::Store {
            message: format!("no settings document for user {uid}"),
        })?;
        document.user_configuration.detection_frequency = ms;
        self.put_user(&document).await
    }
}
