//! File-based issued-number ledger.
//!
//! All issued numbers live in one `numbers/ledger.json` document. Inserts
//! read, check and rewrite it under a single exclusive lock, which is what
//! makes a batch all-or-nothing.

use std::collections::HashSet;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::json::{read_locked, update_locked};
use crate::domain::IssuedNumber;
use crate::error::{StorageError, StorageResult};
use crate::storage::traits::NumberStorage;

/// On-disk shape of the ledger.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Ledger {
    /// Kept sorted by value.
    numbers: Vec<IssuedNumber>,
}

/// File-based number storage implementation.
pub struct FileNumberStorage {
    ledger_path: PathBuf,
    lock: Mutex<()>,
}

impl FileNumberStorage {
    /// Create a new file number storage.
    #[must_use]
    pub fn new(ledger_path: PathBuf) -> Self {
        Self {
            ledger_path,
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> StorageResult<Vec<IssuedNumber>> {
        Ok(read_locked::<Ledger>(&self.ledger_path)?
            .map(|ledger| ledger.numbers)
            .unwrap_or_default())
    }
}

#[async_trait]
impl NumberStorage for FileNumberStorage {
    async fn issued_in_range(&self, start: u64, end: u64) -> StorageResult<HashSet<u64>> {
        let _guard = self.lock.lock().await;
        Ok(self
            .load()?
            .into_iter()
            .map(|n| n.number)
            .filter(|n| (start..end).contains(n))
            .collect())
    }

    async fn insert_numbers(&self, numbers: &[IssuedNumber]) -> StorageResult<()> {
        let _guard = self.lock.lock().await;

        update_locked(&self.ledger_path, |ledger: &mut Ledger| {
            let mut taken: HashSet<u64> = ledger.numbers.iter().map(|n| n.number).collect();
            for issued in numbers {
                if !taken.insert(issued.number) {
                    return Err(StorageError::Conflict(format!(
                        "number {} already issued",
                        issued.number
                    )));
                }
            }

            ledger.numbers.extend_from_slice(numbers);
            ledger.numbers.sort_unstable_by_key(|n| n.number);
            Ok(())
        })
    }

    async fn numbers_for_participant(&self, document: &str) -> StorageResult<Vec<IssuedNumber>> {
        let _guard = self.lock.lock().await;
        Ok(self
            .load()?
            .into_iter()
            .filter(|n| n.document == document)
            .collect())
    }

    async fn count_for_participant(
        &self,
        document: &str,
        since: Option<i64>,
    ) -> StorageResult<u64> {
        let _guard = self.lock.lock().await;
        let since = since.unwrap_or(i64::MIN);
        let count = self
            .load()?
            .iter()
            .filter(|n| n.document == document && n.issued_at >= since)
            .count();
        Ok(count as u64)
    }

    async fn count_issued_since(&self, since: i64) -> StorageResult<u64> {
        let _guard = self.lock.lock().await;
        let count = self
            .load()?
            .iter()
            .filter(|n| n.issued_at >= since)
            .count();
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn issued(number: u64, document: &str, issued_at: i64) -> IssuedNumber {
        IssuedNumber {
            number,
            document: document.to_string(),
            allocation_id: Uuid::new_v4(),
            issued_at,
        }
    }

    fn create_test_storage() -> (FileNumberStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileNumberStorage::new(temp_dir.path().join("ledger.json"));
        (storage, temp_dir)
    }

    #[tokio::test]
    async fn test_empty_ledger() {
        let (storage, _temp) = create_test_storage();
        assert!(storage.issued_in_range(0, 100).await.unwrap().is_empty());
        assert_eq!(storage.count_issued_since(0).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_conflicting_batch_writes_nothing() {
        let (storage, _temp) = create_test_storage();
        storage
            .insert_numbers(&[issued(10, "11111111111", 1), issued(3, "11111111111", 1)])
            .await
            .unwrap();

        let result = storage
            .insert_numbers(&[issued(4, "22222222222", 2), issued(10, "22222222222", 2)])
            .await;
        assert!(matches!(result, Err(StorageError::Conflict(_))));

        assert_eq!(
            storage.issued_in_range(0, 100).await.unwrap(),
            HashSet::from([3, 10])
        );
        assert_eq!(
            storage
                .count_for_participant("22222222222", None)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_participant_numbers_sorted() {
        let (storage, _temp) = create_test_storage();
        storage
            .insert_numbers(&[issued(50, "11111111111", 1), issued(7, "11111111111", 1)])
            .await
            .unwrap();
        storage
            .insert_numbers(&[issued(20, "11111111111", 5), issued(8, "22222222222", 5)])
            .await
            .unwrap();

        let values: Vec<u64> = storage
            .numbers_for_participant("11111111111")
            .await
            .unwrap()
            .iter()
            .map(|n| n.number)
            .collect();
        assert_eq!(values, vec![7, 20, 50]);

        assert_eq!(
            storage
                .count_for_participant("11111111111", Some(5))
                .await
                .unwrap(),
            1
        );
        assert_eq!(storage.count_issued_since(5).await.unwrap(), 2);
    }
}
