use super::{SettingsStore, UserDocument};
use crate::error::Result;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// In-memory store, for tests and sessions without persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<String, UserDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl SettingsStore for MemoryStore {
    async fn get_user(&self, uid: &str) -> Result<Option<UserDocument>> {
        Ok(self
            .users
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(uid)
            .cloned())
    }

    async fn put_user(&self, document: &UserDocument) -> Result<()> {
        self.users
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(document.account_id.clone(), document.clone());
        Ok(())
    }
}
