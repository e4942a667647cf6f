use super::{SettingsStore, UserDocument};
use crate::error::{Result, ScannerError};
use std::path::{Path, PathBuf};

/// Stores each user document as `<root>/users/<uid>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, uid: &str) -> Result<PathBuf> {
        let valid = !uid.is_empty()
            && uid
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'))
            && !uid.starts_with('.');
        if !valid {
            return Err(ScannerError::Store {
                message: format!("invalid user id '{uid}'"),
            });
        }
        Ok(self.root.join("users").join(format!("{uid}.json")))
    }
}

#[async_trait::async_trait]
impl SettingsStore for JsonFileStore {
    async fn get_user(&self, uid: &str) -> Result<Option<UserDocument>> {
        let path = self.document_path(uid)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put_user(&self, document: &UserDocument) -> Result<()> {
        let path = self.document_path(&document.account_id)?;
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let json = serde_json::to_string_pretty(document)?;
        // Write then rename so readers never see a half-written document
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        assert_eq!(store.get_user("alice").await.unwrap(), None);
        store.ensure_user("alice").await.unwrap();
        store.update_detection_frequency("alice", 1500).await.unwrap();

        let reopened = JsonFileStore::new(dir.path());
        assert_eq!(reopened.get_detection_frequency("alice").await.unwrap(), 1500);
    }

    #[tokio::test]
    async fn test_document_layout_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.ensure_user("bob").await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("users").join("bob.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["accountId"], "bob");
        assert_eq!(value["userConfiguration"]["detectionFrequency"], 200);
        assert!(!dir.path().join("users").join("bob.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_rejects_path_like_user_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        for uid in ["", "../etc", "a/b", ".hidden"] {
            assert!(
                matches!(store.get_user(uid).await, Err(ScannerError::Store { .. })),
                "accepted {uid:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_corrupt_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("users")).unwrap();
        std::fs::write(dir.path().join("users").join("eve.json"), "{not json").unwrap();

        let store = JsonFileStore::new(dir.path());
        assert!(matches!(store.get_user("eve").await, Err(ScannerError::Json(_))));
    }
}
