//! File-based participant registry.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::json::{create_locked, read_locked, sanitize_name};
use crate::domain::Participant;
use crate::error::StorageResult;
use crate::storage::traits::ParticipantStorage;

/// One JSON file per participant, named after the document.
pub struct FileParticipantStorage {
    participants_dir: PathBuf,
    lock: Mutex<()>,
}

impl FileParticipantStorage {
    /// Create a new file participant storage.
    #[must_use]
    pub fn new(participants_dir: PathBuf) -> Self {
        Self {
            participants_dir,
            lock: Mutex::new(()),
        }
    }

    fn participant_path(&self, document: &str) -> PathBuf {
        self.participants_dir
            .join(format!("{}.json", sanitize_name(document)))
    }
}

#[async_trait]
impl ParticipantStorage for FileParticipantStorage {
    async fn insert_participant(&self, participant: &Participant) -> StorageResult<()> {
        let _guard = self.lock.lock().await;
        create_locked(&self.participant_path(&participant.document), participant)
    }

    async fn get_participant(&self, document: &str) -> StorageResult<Option<Participant>> {
        let _guard = self.lock.lock().await;
        read_locked(&self.participant_path(document))
    }
}
