//! Signed-in user and the dashboard operations.

use crate::controller::Controller;
use crate::error::Result;
use crate::events::{Alert, AppEvent, EventSink};
use crate::i18n::Catalog;
use crate::store::SettingsStore;
use serde::Serialize;
use std::sync::Arc;

/// What the dashboard shows for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub account_id: String,
    pub detection_frequency: u32,
    /// Labels detected this session, each once.
    pub detections: Vec<String>,
}

pub struct Account {
    uid: String,
    store: Arc<dyn SettingsStore>,
    events: Arc<dyn EventSink>,
    catalog: Catalog,
}

impl Account {
    /// Sign a user in, creating their settings document on first use.
    pub async fn sign_in(
        uid: &str,
        store: Arc<dyn SettingsStore>,
        events: Arc<dyn EventSink>,
        catalog: Catalog,
    ) -> Result<Self> {
        store.ensure_user(uid).await?;
        log::debug!("Signed in as {uid}");
        Ok(Self {
            uid: uid.to_string(),
            store,
            events,
            catalog,
        })
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub async fn detection_frequency(&self) -> Result<u32> {
        self.store.get_detection_frequency(&self.uid).await
    }

    /// Persist a new detection frequency and confirm it to the user.
    pub async fn save_frequency(&self, ms: u32) -> Result<()> {
        self.store.update_detection_frequency(&self.uid, ms).await?;
        self.events.emit(AppEvent::Alert {
            alert: Alert::ChangesSaved,
            message: self.catalog.alert(Alert::ChangesSaved),
        });
        Ok(())
    }

    /// Load the stored frequency into a running controller.
    pub async fn apply_to(&self, controller: &Controller) -> Result<u32> {
        let ms = self.detection_frequency().await?;
        controller.set_detection_interval(ms)?;
        Ok(ms)
    }

    pub async fn dashboard(&self, controller: &Controller) -> Result<Dashboard> {
        Ok(Dashboard {
            account_id: self.uid.clone(),
            detection_frequency: self.detection_frequency().await?,
            detections: controller.history(),
        })
    }
}
