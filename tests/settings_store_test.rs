//! Per-user settings persisted on disk and applied to a controller.

use scannercam::camera::SyntheticSource;
use scannercam::events::{ChannelSink, NullSink};
use scannercam::i18n::Catalog;
use scannercam::speech::MockSynthesizer;
use scannercam::store::{JsonFileStore, SettingsStore};
use scannercam::vision::detector::{MockDetector, ReadyLoader};
use scannercam::{Account, Alert, AppEvent, Controller, ControllerConfig, Platform, ScannerError};
use std::sync::Arc;
use tempfile::TempDir;

fn controller() -> Controller {
    Controller::builder(
        Arc::new(ReadyLoader::new(Arc::new(MockDetector::new()))),
        Arc::new(SyntheticSource::ready(640, 480, (640.0, 480.0))),
        Arc::new(MockSynthesizer::with_locales(&["en-US"])),
    )
    .config(ControllerConfig {
        platform: Platform::Desktop,
        ..ControllerConfig::default()
    })
    .build()
    .unwrap()
}

#[tokio::test]
async fn test_first_sign_in_writes_default_document() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn SettingsStore> = Arc::new(JsonFileStore::new(dir.path()));

    Account::sign_in(
        "alice",
        store.clone(),
        Arc::new(NullSink),
        Catalog::for_locale("en-US").unwrap(),
    )
    .await
    .unwrap();

    let raw = std::fs::read_to_string(dir.path().join("users").join("alice.json")).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc["accountId"], "alice");
    assert_eq!(doc["userConfiguration"]["detectionFrequency"], 200);
    assert_eq!(doc["detections"], serde_json::json!([]));
}

#[tokio::test]
async fn test_saved_frequency_survives_a_new_store_instance() {
    let dir = TempDir::new().unwrap();
    let (sink, events) = ChannelSink::bounded(8);
    let account = Account::sign_in(
        "bob",
        Arc::new(JsonFileStore::new(dir.path())),
        Arc::new(sink),
        Catalog::for_locale("es-ES").unwrap(),
    )
    .await
    .unwrap();
    account.save_frequency(1500).await.unwrap();

    assert_eq!(
        events.try_recv().unwrap(),
        AppEvent::Alert {
            alert: Alert::ChangesSaved,
            message: "Cambios guardados correctamente.".to_string(),
        }
    );

    let reopened = JsonFileStore::new(dir.path());
    assert_eq!(reopened.get_detection_frequency("bob").await.unwrap(), 1500);
}

#[tokio::test(start_paused = true)]
async fn test_stored_frequency_drives_the_sampler() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path()));
    store.ensure_user("carol").await.unwrap();
    store.update_detection_frequency("carol", 0).await.unwrap();

    let account = Account::sign_in(
        "carol",
        store,
        Arc::new(NullSink),
        Catalog::for_locale("en-US").unwrap(),
    )
    .await
    .unwrap();
    let controller = controller();
    assert_eq!(account.apply_to(&controller).await.unwrap(), 0);
    assert_eq!(controller.detection_interval(), 0);
}

#[tokio::test]
async fn test_out_of_range_frequency_is_not_stored() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path());
    store.ensure_user("dave").await.unwrap();

    assert!(matches!(
        store.update_detection_frequency("dave", 2001).await,
        Err(ScannerError::DetectionFrequencyOutOfRange { value: 2001, .. })
    ));
    assert_eq!(store.get_detection_frequency("dave").await.unwrap(), 200);
}

#[tokio::test]
async fn test_frequency_of_unknown_user_is_default() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path());
    assert_eq!(store.get_detection_frequency("nobody").await.unwrap(), 200);
    assert!(store.get_user("nobody").await.unwrap().is_none());
}
