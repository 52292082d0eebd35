//! Lucky-number allocation.
//!
//! Ties the pieces together for one generation request: participant lookup,
//! limit check, generation against the issued set, atomic insert and
//! formatting. The storage insert is the uniqueness authority; when it
//! reports a duplicate the request is regenerated against a fresh read.

use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::config::GenerationConfig;
use crate::domain::{
    Algorithm, Allocation, IssuedNumber, NumberEntry, ParticipantNumbersResponse,
    normalize_document,
};
use crate::error::{AppError, Result, StorageError};
use crate::service::formatter::format_number;
use crate::service::generator::{GenerationRequest, NumberGenerator};
use crate::service::limits::{LimitDecision, UsageCounts, campaign_day_start, check_and_reserve};
use crate::service::series::{compute_series, total_capacity};
use crate::storage::traits::Storage;

/// Cursor used by the sequential algorithm.
pub const SEQUENTIAL_CURSOR: &str = "sequential";

/// Service that hands out lucky numbers to participants.
pub struct AllocationService {
    /// Storage backend.
    storage: Arc<dyn Storage>,
    generator: NumberGenerator,
    max_request_quantity: u32,
    conflict_retries: u32,
}

impl AllocationService {
    /// Create a new allocation service.
    pub fn new(storage: Arc<dyn Storage>, config: &GenerationConfig) -> Self {
        Self::with_generator(storage, config, NumberGenerator::new())
    }

    /// Create an allocation service with a specific generator.
    pub fn with_generator(
        storage: Arc<dyn Storage>,
        config: &GenerationConfig,
        generator: NumberGenerator,
    ) -> Self {
        Self {
            storage,
            generator,
            max_request_quantity: config.max_request_quantity,
            conflict_retries: config.conflict_retries,
        }
    }

    /// Issue `quantity` new lucky numbers to the participant behind `document`.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` if `quantity` is zero or above the per-request cap
    /// - `ParticipantNotFound` if the document is not registered
    /// - `LimitExceeded` if an enabled limit would be passed
    /// - `CapacityExhausted` if the number space cannot hold the request
    /// - `StorageConflict` if every attempt collided with a concurrent writer
    pub async fn allocate(&self, document: &str, quantity: u32) -> Result<Allocation> {
        let started = Instant::now();

        if quantity == 0 {
            return Err(AppError::InvalidQuantity(
                "quantity must be at least 1".to_string(),
            ));
        }
        if quantity > self.max_request_quantity {
            return Err(AppError::InvalidQuantity(format!(
                "quantity must not exceed {}",
                self.max_request_quantity
            )));
        }

        let document = normalize_document(document).map_err(AppError::BadRequest)?;
        if self.storage.get_participant(&document).await?.is_none() {
            return Err(AppError::ParticipantNotFound(document));
        }

        let config = self
            .storage
            .get_campaign_config()
            .await?
            .unwrap_or_default();
        let series = compute_series(config.series_count)?;
        let bound = total_capacity(config.series_count);

        let now = chrono::Utc::now();
        let day_start =
            campaign_day_start(now, config.limits.day_boundary_offset_minutes).timestamp_millis();
        let usage = UsageCounts {
            participant_total: self.storage.count_for_participant(&document, None).await?,
            participant_daily: self
                .storage
                .count_for_participant(&document, Some(day_start))
                .await?,
            global_daily: self.storage.count_issued_since(day_start).await?,
        };

        if let LimitDecision::Deny(reason) =
            check_and_reserve(&document, u64::from(quantity), usage, &config.limits)
        {
            metrics::counter!("lucky_number_limit_denials_total", "reason" => reason.as_str())
                .increment(1);
            return Err(AppError::LimitExceeded(reason));
        }

        let sequential = config.algorithm.algorithm == Algorithm::Sequential;
        let allocation_id = Uuid::new_v4();
        let attempts = self.conflict_retries.saturating_add(1);

        for attempt in 1..=attempts {
            let issued = self.storage.issued_in_range(0, bound).await?;
            let cursor = if sequential {
                self.storage.get_cursor(SEQUENTIAL_CURSOR).await?
            } else {
                None
            };

            let generated = self.generator.generate(&GenerationRequest {
                quantity,
                bound,
                issued: &issued,
                algorithm: &config.algorithm,
                cursor,
            })?;

            let issued_at = chrono::Utc::now().timestamp_millis();
            let records: Vec<IssuedNumber> = generated
                .numbers
                .iter()
                .map(|&number| IssuedNumber {
                    number,
                    document: document.clone(),
                    allocation_id,
                    issued_at,
                })
                .collect();

            match self.storage.insert_numbers(&records).await {
                Ok(()) => {}
                Err(StorageError::Conflict(detail)) => {
                    metrics::counter!("lucky_number_allocation_conflicts_total").increment(1);
                    tracing::warn!(
                        document = %document,
                        attempt,
                        attempts,
                        detail = %detail,
                        "Issued-number conflict, regenerating"
                    );
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            // Only advance from the value this attempt scanned from, so a slower
            // request or a reseed from a config change is never overwritten.
            if let Some(next) = generated.next_cursor.filter(|_| sequential)
                && !self
                    .storage
                    .compare_and_set_cursor(SEQUENTIAL_CURSOR, cursor, next)
                    .await?
            {
                tracing::debug!(next, "Sequential cursor moved concurrently, keeping it");
            }

            let formatted = generated
                .numbers
                .iter()
                .map(|&n| format_number(n, &config.format))
                .collect();

            metrics::counter!(
                "lucky_numbers_issued_total",
                "algorithm" => config.algorithm.algorithm.to_string()
            )
            .increment(u64::from(quantity));
            metrics::histogram!("lucky_number_allocation_duration_seconds")
                .record(started.elapsed().as_secs_f64());

            tracing::info!(
                document = %document,
                %allocation_id,
                quantity,
                series = series.len(),
                algorithm = %config.algorithm.algorithm,
                attempt,
                "Lucky numbers issued"
            );

            return Ok(Allocation {
                allocation_id,
                document,
                numbers: generated.numbers,
                formatted,
                issued_at,
            });
        }

        Err(AppError::StorageConflict(attempts))
    }

    /// Every number the participant holds, with display strings.
    ///
    /// # Errors
    ///
    /// Returns `ParticipantNotFound` if the document is not registered, or an
    /// error if storage fails.
    pub async fn list_numbers(&self, document: &str) -> Result<ParticipantNumbersResponse> {
        let document = normalize_document(document).map_err(AppError::BadRequest)?;
        if self.storage.get_participant(&document).await?.is_none() {
            return Err(AppError::ParticipantNotFound(document));
        }

        let config = self
            .storage
            .get_campaign_config()
            .await?
            .unwrap_or_default();
        let numbers: Vec<NumberEntry> = self
            .storage
            .numbers_for_participant(&document)
            .await?
            .into_iter()
            .map(|issued| NumberEntry {
                formatted: format_number(issued.number, &config.format),
                number: issued.number,
                allocation_id: issued.allocation_id,
                issued_at: issued.issued_at,
            })
            .collect();

        Ok(ParticipantNumbersResponse {
            document,
            total: numbers.len(),
            numbers,
        })
    }
}
