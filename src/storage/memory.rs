//! In-memory storage backend.
//!
//! Nothing survives a restart. Used by tests and for quick local runs.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;

use crate::domain::{CampaignConfig, IssuedNumber, Participant};
use crate::error::{StorageError, StorageResult};
use crate::storage::traits::{
    CampaignStorage, NumberStorage, ParticipantStorage, SequenceStorage, Storage,
};

/// In-memory storage implementation.
#[derive(Default)]
pub struct MemoryStorage {
    config: RwLock<Option<CampaignConfig>>,
    participants: DashMap<String, Participant>,
    /// Issued numbers keyed by value.
    numbers: RwLock<BTreeMap<u64, IssuedNumber>>,
    cursors: DashMap<String, u64>,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CampaignStorage for MemoryStorage {
    async fn get_campaign_config(&self) -> StorageResult<Option<CampaignConfig>> {
        Ok(self.config.read().clone())
    }

    async fn save_campaign_config(&self, config: &CampaignConfig) -> StorageResult<()> {
        *self.config.write() = Some(config.clone());
        Ok(())
    }
}

#[async_trait]
impl ParticipantStorage for MemoryStorage {
    async fn insert_participant(&self, participant: &Participant) -> StorageResult<()> {
        match self.participants.entry(participant.document.clone()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(format!(
                "participant '{}' already registered",
                participant.document
            ))),
            Entry::Vacant(slot) => {
                slot.insert(participant.clone());
                Ok(())
            }
        }
    }

    async fn get_participant(&self, document: &str) -> StorageResult<Option<Participant>> {
        Ok(self.participants.get(document).map(|p| p.value().clone()))
    }
}

#[async_trait]
impl NumberStorage for MemoryStorage {
    async fn issued_in_range(&self, start: u64, end: u64) -> StorageResult<HashSet<u64>> {
        if start >= end {
            return Ok(HashSet::new());
        }
        Ok(self.numbers.read().range(start..end).map(|(n, _)| *n).collect())
    }

    async fn insert_numbers(&self, numbers: &[IssuedNumber]) -> StorageResult<()> {
        let mut ledger = self.numbers.write();

        let mut batch = HashSet::with_capacity(numbers.len());
        for issued in numbers {
            if ledger.contains_key(&issued.number) || !batch.insert(issued.number) {
                return Err(StorageError::Conflict(format!(
                    "number {} already issued",
                    issued.number
                )));
            }
        }

        for issued in numbers {
            ledger.insert(issued.number, issued.clone());
        }
        Ok(())
    }

    async fn numbers_for_participant(&self, document: &str) -> StorageResult<Vec<IssuedNumber>> {
        Ok(self
            .numbers
            .read()
            .values()
            .filter(|n| n.document == document)
            .cloned()
            .collect())
    }

    async fn count_for_participant(
        &self,
        document: &str,
        since: Option<i64>,
    ) -> StorageResult<u64> {
        let since = since.unwrap_or(i64::MIN);
        let count = self
            .numbers
            .read()
            .values()
            .filter(|n| n.document == document && n.issued_at >= since)
            .count();
        Ok(count as u64)
    }

    async fn count_issued_since(&self, since: i64) -> StorageResult<u64> {
        let count = self
            .numbers
            .read()
            .values()
            .filter(|n| n.issued_at >= since)
            .count();
        Ok(count as u64)
    }
}

#[async_trait]
impl SequenceStorage for MemoryStorage {
    async fn get_cursor(&self, name: &str) -> StorageResult<Option<u64>> {
        Ok(self.cursors.get(name).map(|v| *v))
    }

    async fn set_cursor(&self, name: &str, value: u64) -> StorageResult<()> {
        self.cursors.insert(name.to_string(), value);
        Ok(())
    }

    async fn compare_and_set_cursor(
        &self,
        name: &str,
        expected: Option<u64>,
        value: u64,
    ) -> StorageResult<bool> {
        match self.cursors.entry(name.to_string()) {
            Entry::Occupied(mut entry) if Some(*entry.get()) == expected => {
                entry.insert(value);
                Ok(true)
            }
            Entry::Vacant(entry) if expected.is_none() => {
                entry.insert(value);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
