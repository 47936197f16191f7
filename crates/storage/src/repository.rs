use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use study_core::model::StudyProgress;
use thiserror::Error;

use crate::codec::{PROGRESS_KEY, decode_progress, encode_progress};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// String key-value port, the stand-in for browser local storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key` in a single write.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Repository contract for the single study progress record.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Load the persisted progress, or zeroed progress if none is usable.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only when the backend itself fails; a missing or
    /// unreadable record yields `StudyProgress::default()`.
    async fn load_progress(&self) -> Result<StudyProgress, StorageError>;

    /// Replace the persisted progress with `progress`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be encoded or written.
    async fn save_progress(&self, progress: &StudyProgress) -> Result<(), StorageError>;
}

/// Simple in-memory store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Stores progress as a JSON document under a fixed key of any `KeyValueStore`.
#[derive(Clone)]
pub struct KeyValueProgressRepository {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl KeyValueProgressRepository {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, PROGRESS_KEY)
    }

    #[must_use]
    pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

#[async_trait]
impl ProgressRepository for KeyValueProgressRepository {
    async fn load_progress(&self) -> Result<StudyProgress, StorageError> {
        let Some(raw) = self.store.get(&self.key).await? else {
            log::debug!("no progress stored under {}; starting fresh", self.key);
            return Ok(StudyProgress::default());
        };

        match decode_progress(&raw) {
            Ok(progress) => Ok(progress),
            Err(err) => {
                log::warn!(
                    "discarding unreadable progress under {}: {err}",
                    self.key
                );
                Ok(StudyProgress::default())
            }
        }
    }

    async fn save_progress(&self, progress: &StudyProgress) -> Result<(), StorageError> {
        let raw = encode_progress(progress)?;
        self.store.put(&self.key, &raw).await
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub store: Arc<dyn KeyValueStore>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    /// Build a `Storage` whose progress lives in `store`.
    #[must_use]
    pub fn over_store(store: Arc<dyn KeyValueStore>) -> Self {
        let progress: Arc<dyn ProgressRepository> =
            Arc::new(KeyValueProgressRepository::new(Arc::clone(&store)));
        Self { store, progress }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::over_store(Arc::new(InMemoryStore::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::model::{ExamResult, SessionStreak};
    use study_core::time::fixed_now;

    fn played_once() -> StudyProgress {
        let result = ExamResult::new(fixed_now(), 10, 7, 70).unwrap();
        StudyProgress::new()
            .record_exam(
                &result,
                SessionStreak {
                    final_streak: 3,
                    peak_streak: 4,
                },
            )
            .progress
    }

    #[tokio::test]
    async fn missing_record_loads_defaults() {
        let storage = Storage::in_memory();
        let progress = storage.progress.load_progress().await.unwrap();
        assert_eq!(progress, StudyProgress::default());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let storage = Storage::in_memory();
        let progress = played_once();
        storage.progress.save_progress(&progress).await.unwrap();

        let loaded = storage.progress.load_progress().await.unwrap();
        assert_eq!(loaded, progress);
        assert!(storage.store.get(PROGRESS_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn corrupt_record_falls_back_to_defaults() {
        let storage = Storage::in_memory();
        storage.store.put(PROGRESS_KEY, "[1, 2").await.unwrap();

        let loaded = storage.progress.load_progress().await.unwrap();
        assert_eq!(loaded, StudyProgress::default());
    }

    #[tokio::test]
    async fn save_replaces_the_whole_record() {
        let storage = Storage::in_memory();
        storage.progress.save_progress(&played_once()).await.unwrap();
        storage
            .progress
            .save_progress(&StudyProgress::default())
            .await
            .unwrap();

        let loaded = storage.progress.load_progress().await.unwrap();
        assert_eq!(loaded, StudyProgress::default());
    }

    #[tokio::test]
    async fn custom_key_is_isolated() {
        let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        let a = KeyValueProgressRepository::with_key(Arc::clone(&store), "learner-a");
        let b = KeyValueProgressRepository::with_key(store, "learner-b");

        a.save_progress(&played_once()).await.unwrap();
        assert_eq!(b.load_progress().await.unwrap(), StudyProgress::default());
        assert_eq!(a.key(), "learner-a");
    }
}
