//! Durable-state collaborator boundary.
//!
//! The engine does not own persistence; callers provide a [`StateStore`]
//! that is read at startup and written after each successful state
//! transition (committed policy key, adopted sync key, adapted
//! heartbeat). [`MemoryStore`] backs tests and embedders that persist
//! elsewhere.

use crate::error::EasResult;
use easync_protocol::{Folder, SyncKey, FOLDER_SYNC_KEY_INITIAL};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Durable per-account engine state.
pub trait StateStore: Send + Sync + 'static {
    /// The committed policy key, if the account is provisioned.
    fn policy_key(&self) -> EasResult<Option<String>>;

    /// Commits or clears the policy key.
    fn set_policy_key(&self, key: Option<&str>) -> EasResult<()>;

    /// The folder hierarchy sync key; the initial key when never synced.
    fn folder_sync_key(&self) -> EasResult<String>;

    /// Stores the folder hierarchy sync key.
    fn set_folder_sync_key(&self, key: &str) -> EasResult<()>;

    /// The known folder hierarchy.
    fn folders(&self) -> EasResult<Vec<Folder>>;

    /// Replaces the known folder hierarchy.
    fn set_folders(&self, folders: &[Folder]) -> EasResult<()>;

    /// The sync key of a collection; the initial key when never synced.
    fn sync_key(&self, collection_id: &str) -> EasResult<SyncKey>;

    /// Stores the sync key of a collection.
    fn set_sync_key(&self, collection_id: &str, key: &SyncKey) -> EasResult<()>;

    /// The persisted Direct Push heartbeat, if any.
    fn heartbeat(&self) -> EasResult<Option<u32>>;

    /// Persists the Direct Push heartbeat.
    fn set_heartbeat(&self, secs: u32) -> EasResult<()>;
}

/// An in-memory state store.
#[derive(Default)]
pub struct MemoryStore {
    policy_key: RwLock<Option<String>>,
    folder_sync_key: RwLock<Option<String>>,
    folders: RwLock<Vec<Folder>>,
    sync_keys: RwLock<HashMap<String, SyncKey>>,
    heartbeat: RwLock<Option<u32>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn policy_key(&self) -> EasResult<Option<String>> {
        Ok(self.policy_key.read().clone())
    }

    fn set_policy_key(&self, key: Option<&str>) -> EasResult<()> {
        *self.policy_key.write() = key.map(str::to_string);
        Ok(())
    }

    fn folder_sync_key(&self) -> EasResult<String> {
        Ok(self
            .folder_sync_key
            .read()
            .clone()
            .unwrap_or_else(|| FOLDER_SYNC_KEY_INITIAL.to_string()))
    }

    fn set_folder_sync_key(&self, key: &str) -> EasResult<()> {
        *self.folder_sync_key.write() = Some(key.to_string());
        Ok(())
    }

    fn folders(&self) -> EasResult<Vec<Folder>> {
        Ok(self.folders.read().clone())
    }

    fn set_folders(&self, folders: &[Folder]) -> EasResult<()> {
        *self.folders.write() = folders.to_vec();
        Ok(())
    }

    fn sync_key(&self, collection_id: &str) -> EasResult<SyncKey> {
        Ok(self
            .sync_keys
            .read()
            .get(collection_id)
            .cloned()
            .unwrap_or_else(SyncKey::initial))
    }

    fn set_sync_key(&self, collection_id: &str, key: &SyncKey) -> EasResult<()> {
        self.sync_keys
            .write()
            .insert(collection_id.to_string(), key.clone());
        Ok(())
    }

    fn heartbeat(&self) -> EasResult<Option<u32>> {
        Ok(*self.heartbeat.read())
    }

    fn set_heartbeat(&self, secs: u32) -> EasResult<()> {
        *self.heartbeat.write() = Some(secs);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_initial() {
        let store = MemoryStore::new();
        assert_eq!(store.policy_key().unwrap(), None);
        assert_eq!(store.folder_sync_key().unwrap(), "0");
        assert!(store.sync_key("5").unwrap().is_initial());
        assert_eq!(store.heartbeat().unwrap(), None);
    }

    #[test]
    fn keys_round_trip() {
        let store = MemoryStore::new();
        store.set_policy_key(Some("1049")).unwrap();
        assert_eq!(store.policy_key().unwrap().as_deref(), Some("1049"));
        store.set_policy_key(None).unwrap();
        assert_eq!(store.policy_key().unwrap(), None);

        store.set_sync_key("5", &SyncKey::new("7")).unwrap();
        assert_eq!(store.sync_key("5").unwrap().as_str(), "7");
        assert!(store.sync_key("8").unwrap().is_initial());

        store.set_heartbeat(540).unwrap();
        assert_eq!(store.heartbeat().unwrap(), Some(540));
    }
}
