//! File-based campaign configuration storage.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::json::{read_locked, write_locked};
use crate::domain::CampaignConfig;
use crate::error::StorageResult;
use crate::storage::traits::CampaignStorage;

/// Stores the single campaign record in `campaign.json`.
pub struct FileCampaignStorage {
    path: PathBuf,
    /// Mutex for coordinating file operations within this process.
    lock: Mutex<()>,
}

impl FileCampaignStorage {
    /// Create a new file campaign storage.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl CampaignStorage for FileCampaignStorage {
    async fn get_campaign_config(&self) -> StorageResult<Option<CampaignConfig>> {
        let _guard = self.lock.lock().await;
        read_locked(&self.path)
    }

    async fn save_campaign_config(&self, config: &CampaignConfig) -> StorageResult<()> {
        let _guard = self.lock.lock().await;
        write_locked(&self.path, config)
    }
}
