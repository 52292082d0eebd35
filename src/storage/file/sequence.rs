//! File-based cursor storage.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::json::{read_locked, sanitize_name, update_locked};
use crate::error::StorageResult;
use crate::storage::traits::SequenceStorage;

/// Persisted cursor.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CursorState {
    value: u64,
    /// Bumped on every write.
    version: u64,
    /// Last write (milliseconds since epoch).
    updated_at: i64,
}

/// File-based sequence storage implementation.
pub struct FileSequenceStorage {
    /// Directory for cursor files.
    sequences_dir: PathBuf,
    /// Mutex for coordinating file operations within this process.
    lock: Mutex<()>,
}

impl FileSequenceStorage {
    /// Create a new file sequence storage.
    #[must_use]
    pub fn new(sequences_dir: PathBuf) -> Self {
        Self {
            sequences_dir,
            lock: Mutex::new(()),
        }
    }

    /// Get the file path for a cursor.
    fn sequence_path(&self, name: &str) -> PathBuf {
        self.sequences_dir
            .join(format!("{}.json", sanitize_name(name)))
    }
}

#[async_trait]
impl SequenceStorage for FileSequenceStorage {
    async fn get_cursor(&self, name: &str) -> StorageResult<Option<u64>> {
        let _guard = self.lock.lock().await;
        Ok(read_locked::<CursorState>(&self.sequence_path(name))?
            .filter(|state| state.version > 0)
            .map(|state| state.value))
    }

    async fn set_cursor(&self, name: &str, value: u64) -> StorageResult<()> {
        let _guard = self.lock.lock().await;
        update_locked(&self.sequence_path(name), |state: &mut CursorState| {
            state.value = value;
            state.version += 1;
            state.updated_at = chrono::Utc::now().timestamp_millis();
            Ok(())
        })
    }

    async fn compare_and_set_cursor(
        &self,
        name: &str,
        expected: Option<u64>,
        value: u64,
    ) -> StorageResult<bool> {
        let _guard = self.lock.lock().await;
        update_locked(&self.sequence_path(name), |state: &mut CursorState| {
            // A cursor that was never written still has version zero.
            let current = (state.version > 0).then_some(state.value);
            if current != expected {
                return Ok(false);
            }
            state.value = value;
            state.version += 1;
            state.updated_at = chrono::Utc::now().timestamp_millis();
            Ok(true)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_storage() -> (FileSequenceStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileSequenceStorage::new(temp_dir.path().to_path_buf());
        (storage, temp_dir)
    }

    #[tokio::test]
    async fn test_missing_cursor() {
        let (storage, _temp) = create_test_storage();
        assert_eq!(storage.get_cursor("sequential").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_and_overwrite() {
        let (storage, temp) = create_test_storage();

        storage.set_cursor("sequential", 6).await.unwrap();
        storage.set_cursor("sequential", 9).await.unwrap();
        assert_eq!(storage.get_cursor("sequential").await.unwrap(), Some(9));

        let state: CursorState = read_locked(&temp.path().join("sequential.json"))
            .unwrap()
            .unwrap();
        assert_eq!(state.version, 2);
    }

    #[tokio::test]
    async fn test_compare_and_set() {
        let (storage, _temp) = create_test_storage();

        assert!(!storage.compare_and_set_cursor("sequential", Some(0), 3).await.unwrap());
        assert_eq!(storage.get_cursor("sequential").await.unwrap(), None);
        assert!(storage.compare_and_set_cursor("sequential", None, 3).await.unwrap());
        assert!(!storage.compare_and_set_cursor("sequential", None, 7).await.unwrap());
        assert!(!storage.compare_and_set_cursor("sequential", Some(2), 7).await.unwrap());
        assert!(storage.compare_and_set_cursor("sequential", Some(3), 7).await.unwrap());
        assert_eq!(storage.get_cursor("sequential").await.unwrap(), Some(7));
    }
}
