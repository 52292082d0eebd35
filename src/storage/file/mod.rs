//! File-based storage backend.
//!
//! This backend stores data as JSON files with file locking for atomic operations.
//! Suitable for development and single-node deployments.
//!
//! Directory structure:
//! ```text
//! data/
//! ├── campaign.json
//! ├── participants/
//! │   └── {document}.json
//! ├── numbers/
//! │   └── ledger.json
//! └── sequences/
//!     └── {name}.json
//! ```

mod campaign;
mod json;
mod numbers;
mod participants;
mod sequence;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::config::FileStorageConfig;
use crate::domain::{CampaignConfig, IssuedNumber, Participant};
use crate::error::{StorageError, StorageResult};
use crate::storage::traits::{
    CampaignStorage, NumberStorage, ParticipantStorage, SequenceStorage, Storage,
};

pub use campaign::FileCampaignStorage;
pub use numbers::FileNumberStorage;
pub use participants::FileParticipantStorage;
pub use sequence::FileSequenceStorage;

/// File-based storage implementation.
pub struct FileStorage {
    /// Base data directory.
    base_dir: PathBuf,
    campaign_storage: FileCampaignStorage,
    participant_storage: FileParticipantStorage,
    number_storage: FileNumberStorage,
    sequence_storage: FileSequenceStorage,
}

impl FileStorage {
    /// Create a new file storage instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directories cannot be created.
    pub fn new(config: &FileStorageConfig) -> StorageResult<Self> {
        let base_dir = config.data_dir.clone();

        Self::ensure_directories(&base_dir)?;

        Ok(Self {
            campaign_storage: FileCampaignStorage::new(base_dir.join("campaign.json")),
            participant_storage: FileParticipantStorage::new(base_dir.join("participants")),
            number_storage: FileNumberStorage::new(base_dir.join("numbers/ledger.json")),
            sequence_storage: FileSequenceStorage::new(base_dir.join("sequences")),
            base_dir,
        })
    }

    /// Ensure all required directories exist.
    fn ensure_directories(base_dir: &Path) -> StorageResult<()> {
        let dirs = [
            base_dir.to_path_buf(),
            base_dir.join("participants"),
            base_dir.join("numbers"),
            base_dir.join("sequences"),
        ];

        for dir in &dirs {
            std::fs::create_dir_all(dir).map_err(|e| {
                StorageError::FileIO(format!("Failed to create directory {}: {e}", dir.display()))
            })?;
        }

        Ok(())
    }
}

#[async_trait]
impl CampaignStorage for FileStorage {
    async fn get_campaign_config(&self) -> StorageResult<Option<CampaignConfig>> {
        self.campaign_storage.get_campaign_config().await
    }

    async fn save_campaign_config(&self, config: &CampaignConfig) -> StorageResult<()> {
        self.campaign_storage.save_campaign_config(config).await
    }
}

#[async_trait]
impl ParticipantStorage for FileStorage {
    async fn insert_participant(&self, participant: &Participant) -> StorageResult<()> {
        self.participant_storage.insert_participant(participant).await
    }

    async fn get_participant(&self, document: &str) -> StorageResult<Option<Participant>> {
        self.participant_storage.get_participant(document).await
    }
}

#[async_trait]
impl NumberStorage for FileStorage {
    async fn issued_in_range(&self, start: u64, end: u64) -> StorageResult<HashSet<u64>> {
        self.number_storage.issued_in_range(start, end).await
    }

    async fn insert_numbers(&self, numbers: &[IssuedNumber]) -> StorageResult<()> {
        self.number_storage.insert_numbers(numbers).await
    }

    async fn numbers_for_participant(&self, document: &str) -> StorageResult<Vec<IssuedNumber>> {
        self.number_storage.numbers_for_participant(document).await
    }

    async fn count_for_participant(
        &self,
        document: &str,
        since: Option<i64>,
    ) -> StorageResult<u64> {
        self.number_storage
            .count_for_participant(document, since)
            .await
    }

    async fn count_issued_since(&self, since: i64) -> StorageResult<u64> {
        self.number_storage.count_issued_since(since).await
    }
}

#[async_trait]
impl SequenceStorage for FileStorage {
    async fn get_cursor(&self, name: &str) -> StorageResult<Option<u64>> {
        self.sequence_storage.get_cursor(name).await
    }

    async fn set_cursor(&self, name: &str, value: u64) -> StorageResult<()> {
        self.sequence_storage.set_cursor(name, value).await
    }

    async fn compare_and_set_cursor(
        &self,
        name: &str,
        expected: Option<u64>,
        value: u64,
    ) -> StorageResult<bool> {
        self.sequence_storage
            .compare_and_set_cursor(name, expected, value)
            .await
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn health_check(&self) -> StorageResult<()> {
        if !self.base_dir.exists() {
            return Err(StorageError::Unavailable);
        }

        // Try to create a test file
        let test_file = self.base_dir.join(".health_check");
        tokio::fs::write(&test_file, b"ok")
            .await
            .map_err(|e| StorageError::FileIO(format!("Health check failed: {e}")))?;
        tokio::fs::remove_file(&test_file)
            .await
            .map_err(|e| StorageError::FileIO(format!("Health check cleanup failed: {e}")))?;

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
