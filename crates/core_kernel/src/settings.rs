//! Institution settings
//!
//! A flat key → string map (institution name, document number, storage
//! paths). The core only cares about it as the CONFIG row type of a backup,
//! where the key plays the role of the id.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ports::{DomainPort, PortError};

/// Well-known keys written by the facility's settings screen
pub mod keys {
    pub const INSTITUTION_NAME: &str = "institution_name";
    pub const INSTITUTION_DOCUMENT: &str = "institution_document";
    pub const STORAGE_PATH: &str = "storage_path";
}

/// One configuration entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

impl Setting {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            updated_at: Utc::now(),
        }
    }
}

/// Storage port for settings
#[async_trait]
pub trait SettingsPort: DomainPort {
    /// Lists every entry, ordered by key
    async fn list(&self) -> Result<Vec<Setting>, PortError>;

    /// Gets one entry
    async fn get(&self, key: &str) -> Result<Option<Setting>, PortError>;

    /// Inserts a new entry; fails with `Conflict` if the key exists
    async fn insert(&self, setting: Setting) -> Result<Setting, PortError>;

    /// Creates or replaces an entry
    async fn put(&self, setting: Setting) -> Result<Setting, PortError>;
}

/// In-memory settings store
#[cfg(any(test, feature = "memory"))]
pub mod memory {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    #[derive(Debug, Default, Clone)]
    pub struct InMemorySettingsPort {
        entries: Arc<RwLock<BTreeMap<String, Setting>>>,
    }

    impl InMemorySettingsPort {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl DomainPort for InMemorySettingsPort {}

    #[async_trait]
    impl SettingsPort for InMemorySettingsPort {
        async fn list(&self) -> Result<Vec<Setting>, PortError> {
            Ok(self.entries.read().await.values().cloned().collect())
        }

        async fn get(&self, key: &str) -> Result<Option<Setting>, PortError> {
            Ok(self.entries.read().await.get(key).cloned())
        }

        async fn insert(&self, setting: Setting) -> Result<Setting, PortError> {
            let mut entries = self.entries.write().await;
            if entries.contains_key(&setting.key) {
                return Err(PortError::conflict(format!(
                    "Setting '{}' already exists",
                    setting.key
                )));
            }
            entries.insert(setting.key.clone(), setting.clone());
            Ok(setting)
        }

        async fn put(&self, setting: Setting) -> Result<Setting, PortError> {
            self.entries
                .write()
                .await
                .insert(setting.key.clone(), setting.clone());
            Ok(setting)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::InMemorySettingsPort;
    use super::*;

    #[tokio::test]
    async fn test_insert_rejects_existing_key() {
        let port = InMemorySettingsPort::new();
        port.insert(Setting::new(keys::INSTITUTION_NAME, "Lar São Vicente"))
            .await
            .unwrap();

        let second = port.insert(Setting::new(keys::INSTITUTION_NAME, "Other")).await;
        assert!(second.unwrap_err().is_conflict());

        let stored = port.get(keys::INSTITUTION_NAME).await.unwrap().unwrap();
        assert_eq!(stored.value, "Lar São Vicente");
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_key() {
        let port = InMemorySettingsPort::new();
        port.put(Setting::new("b", "2")).await.unwrap();
        port.put(Setting::new("a", "1")).await.unwrap();

        let keys: Vec<_> = port.list().await.unwrap().into_iter().map(|s| s.key).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
