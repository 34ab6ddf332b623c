use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::repository::StorageError;

/// Named collections persisted as one JSON document each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKey {
    Questions,
    Attempts,
    Users,
    Videos,
    Materials,
    ChatMessages,
    ChatRooms,
    ImportBatches,
    Comments,
    Logs,
    Notifications,
    CurrentUser,
}

impl CollectionKey {
    pub const ALL: [CollectionKey; 12] = [
        CollectionKey::Questions,
        CollectionKey::Attempts,
        CollectionKey::Users,
        CollectionKey::Videos,
        CollectionKey::Materials,
        CollectionKey::ChatMessages,
        CollectionKey::ChatRooms,
        CollectionKey::ImportBatches,
        CollectionKey::Comments,
        CollectionKey::Logs,
        CollectionKey::Notifications,
        CollectionKey::CurrentUser,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CollectionKey::Questions => "prep_questions",
            CollectionKey::Attempts => "prep_attempts",
            CollectionKey::Users => "prep_users",
            CollectionKey::Videos => "prep_videos",
            CollectionKey::Materials => "prep_materials",
            CollectionKey::ChatMessages => "prep_chat_messages",
            CollectionKey::ChatRooms => "prep_chat_rooms",
            CollectionKey::ImportBatches => "prep_import_batches",
            CollectionKey::Comments => "prep_comments",
            CollectionKey::Logs => "prep_logs",
            CollectionKey::Notifications => "prep_notifications",
            CollectionKey::CurrentUser => "prep_current_user",
        }
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw key-value boundary. Values are opaque JSON documents.
///
/// A missing key is `Ok(None)`, never an error.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the backend cannot be reached.
    async fn get(&self, key: CollectionKey) -> Result<Option<String>, StorageError>;

    /// Replace the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the backend cannot be reached.
    async fn set(&self, key: CollectionKey, value: String) -> Result<(), StorageError>;

    /// Drop the document stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the backend cannot be reached.
    async fn remove(&self, key: CollectionKey) -> Result<(), StorageError>;
}

/// Simple in-memory backend for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryKv {
    entries: Arc<Mutex<HashMap<CollectionKey, String>>>,
}

impl InMemoryKv {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKv {
    async fn get(&self, key: CollectionKey) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&key).cloned())
    }

    async fn set(&self, key: CollectionKey, value: String) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key, value);
        Ok(())
    }

    async fn remove(&self, key: CollectionKey) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let kv = InMemoryKv::new();
        assert_eq!(kv.get(CollectionKey::Attempts).await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_overwrites_and_remove_clears() {
        let kv = InMemoryKv::new();
        kv.set(CollectionKey::Logs, "[1]".into()).await.unwrap();
        kv.set(CollectionKey::Logs, "[2]".into()).await.unwrap();
        assert_eq!(
            kv.get(CollectionKey::Logs).await.unwrap().as_deref(),
            Some("[2]")
        );
        kv.remove(CollectionKey::Logs).await.unwrap();
        assert_eq!(kv.get(CollectionKey::Logs).await.unwrap(), None);
    }

    #[test]
    fn collection_keys_are_unique() {
        let mut names: Vec<_> = CollectionKey::ALL.iter().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CollectionKey::ALL.len());
    }
}
