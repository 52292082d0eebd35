//! Storage trait definitions.
//!
//! These traits define the interface for storage backends, enabling swapping
//! between different implementations without changing business logic.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::domain::{CampaignConfig, IssuedNumber, Participant};
use crate::error::StorageResult;

/// Campaign configuration storage.
///
/// The campaign has exactly one configuration record.
#[async_trait]
pub trait CampaignStorage: Send + Sync {
    /// Load the stored configuration, if one was ever saved.
    async fn get_campaign_config(&self) -> StorageResult<Option<CampaignConfig>>;

    /// Replace the stored configuration.
    async fn save_campaign_config(&self, config: &CampaignConfig) -> StorageResult<()>;
}

/// Participant registry.
#[async_trait]
pub trait ParticipantStorage: Send + Sync {
    /// Insert a new participant.
    ///
    /// Fails with `StorageError::Conflict` when the document is already registered.
    async fn insert_participant(&self, participant: &Participant) -> StorageResult<()>;

    /// Look up a participant by normalized document.
    async fn get_participant(&self, document: &str) -> StorageResult<Option<Participant>>;
}

/// Issued-number ledger.
///
/// The ledger is the source of truth for uniqueness: no value may appear twice.
#[async_trait]
pub trait NumberStorage: Send + Sync {
    /// Every issued value in `[start, end)`.
    async fn issued_in_range(&self, start: u64, end: u64) -> StorageResult<HashSet<u64>>;

    /// Insert a batch of numbers atomically.
    ///
    /// If any value is already taken (or repeated within the batch) nothing is
    /// written and `StorageError::Conflict` is returned.
    async fn insert_numbers(&self, numbers: &[IssuedNumber]) -> StorageResult<()>;

    /// All numbers owned by `document`, ascending by value.
    async fn numbers_for_participant(&self, document: &str) -> StorageResult<Vec<IssuedNumber>>;

    /// Count numbers owned by `document`, optionally only those issued at or
    /// after `since` (milliseconds since epoch).
    async fn count_for_participant(&self, document: &str, since: Option<i64>)
    -> StorageResult<u64>;

    /// Count all numbers issued at or after `since` (milliseconds since epoch).
    async fn count_issued_since(&self, since: i64) -> StorageResult<u64>;
}

/// Named cursors for resumable generation.
#[async_trait]
pub trait SequenceStorage: Send + Sync {
    /// Current value of a cursor, if it was ever stored.
    async fn get_cursor(&self, name: &str) -> StorageResult<Option<u64>>;

    /// Store a cursor value, creating it when absent.
    async fn set_cursor(&self, name: &str, value: u64) -> StorageResult<()>;

    /// Store `value` only if the cursor still holds `expected` (`None` means
    /// absent). Returns whether the write happened.
    async fn compare_and_set_cursor(
        &self,
        name: &str,
        expected: Option<u64>,
        value: u64,
    ) -> StorageResult<bool>;
}

/// Combined storage trait for all storage operations.
#[async_trait]
pub trait Storage: CampaignStorage + ParticipantStorage + NumberStorage + SequenceStorage {
    /// Check if the storage backend is healthy and reachable.
    async fn health_check(&self) -> StorageResult<()>;

    /// Get the storage backend name.
    fn backend_name(&self) -> &'static str;
}
