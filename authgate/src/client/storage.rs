use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use super::errors::StorageError;

/// Persistence for the serialized session between process runs. The REST
/// client writes on every session change, clears on sign-out, and reads once
/// at startup. Implementations own their interior mutability.
#[async_trait]
pub trait SessionStorage: Send + Sync + 'static {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Ephemeral storage. Sessions live for the process only; the browser
/// deployment target uses this when no durable storage is wired up.
#[derive(Default)]
pub struct MemorySessionStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        tracing::debug!("Creating in-memory session storage");
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.lock().remove(key);
        Ok(())
    }
}

/// Durable storage for device targets: one JSON object file mapping item
/// keys to serialized values.
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        tracing::debug!("Creating file session storage at {}", path.display());
        Self { path }
    }

    async fn read_entries(&self) -> Result<HashMap<String, String>, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|e| StorageError::Serde(e.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(StorageError::Io(e.to_string())),
        }
    }

    async fn write_entries(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Io(e.to_string()))?;
        }
        let contents =
            serde_json::to_string(entries).map_err(|e| StorageError::Serde(e.to_string()))?;
        tokio::fs::write(&self.path, contents)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))
    }
}

#[async_trait]
impl SessionStorage for FileSessionStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_entries().await?.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.read_entries().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries).await
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.read_entries().await?;
        if entries.remove(key).is_some() {
            self.write_entries(&entries).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_set_and_get() {
        // Given an in-memory session storage
        let storage = MemorySessionStorage::new();

        // When setting a value
        storage.set_item("session", "value-1").await.unwrap();

        // Then it should come back
        let value = storage.get_item("session").await.unwrap();
        assert_eq!(value.as_deref(), Some("value-1"));
    }

    #[tokio::test]
    async fn test_memory_overwrite() {
        let storage = MemorySessionStorage::new();
        storage.set_item("session", "old").await.unwrap();
        storage.set_item("session", "new").await.unwrap();

        let value = storage.get_item("session").await.unwrap();
        assert_eq!(value.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_memory_remove() {
        // Given a stored value
        let storage = MemorySessionStorage::new();
        storage.set_item("session", "value").await.unwrap();

        // When removing it
        storage.remove_item("session").await.unwrap();

        // Then it is gone
        assert_eq!(storage.get_item("session").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_missing_key() {
        let storage = MemorySessionStorage::new();
        assert_eq!(storage.get_item("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_roundtrip_across_instances() {
        // Given a value written by one storage instance
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("auth.json");
        let storage = FileSessionStorage::new(&path);
        storage.set_item("session", "persisted").await.unwrap();

        // When a fresh instance opens the same file
        let reopened = FileSessionStorage::new(&path);

        // Then the value survives
        let value = reopened.get_item("session").await.unwrap();
        assert_eq!(value.as_deref(), Some("persisted"));
    }

    #[tokio::test]
    async fn test_file_missing_file_reads_empty() {
        let temp = tempfile::TempDir::new().unwrap();
        let storage = FileSessionStorage::new(temp.path().join("absent.json"));
        assert_eq!(storage.get_item("session").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_remove() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("auth.json");
        let storage = FileSessionStorage::new(&path);

        storage.set_item("a", "1").await.unwrap();
        storage.set_item("b", "2").await.unwrap();
        storage.remove_item("a").await.unwrap();

        assert_eq!(storage.get_item("a").await.unwrap(), None);
        assert_eq!(storage.get_item("b").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_file_creates_parent_directories() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("nested").join("dir").join("auth.json");
        let storage = FileSessionStorage::new(&path);

        storage.set_item("session", "value").await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_file_corrupt_contents_is_a_serde_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("auth.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        let storage = FileSessionStorage::new(&path);
        let result = storage.get_item("session").await;
        assert!(matches!(result, Err(StorageError::Serde(_))));
    }
}
