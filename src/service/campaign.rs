//! Campaign configuration service.
//!
//! There is one campaign per deployment. Until an operator saves a
//! configuration, every read returns `CampaignConfig::default()`.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{Algorithm, AlgorithmConfig, CampaignConfig, FormatConfig, LimitConfig, Series};
use crate::error::{AppError, Result};
use crate::service::allocation::SEQUENTIAL_CURSOR;
use crate::service::formatter::format_number;
use crate::service::series::compute_series;
use crate::storage::traits::Storage;

/// Service for reading and updating the campaign configuration.
pub struct CampaignService {
    /// Storage backend.
    storage: Arc<dyn Storage>,
    /// Serializes read-modify-write cycles within this process.
    update_lock: Mutex<()>,
}

impl CampaignService {
    /// Create a new campaign service.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            update_lock: Mutex::new(()),
        }
    }

    /// Current configuration, or the defaults when none was saved.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn get_config(&self) -> Result<CampaignConfig> {
        Ok(self
            .storage
            .get_campaign_config()
            .await?
            .unwrap_or_default())
    }

    /// Validate and store a full configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if any section is invalid, or an error
    /// if storage fails.
    pub async fn replace_config(&self, config: CampaignConfig) -> Result<CampaignConfig> {
        let _guard = self.update_lock.lock().await;
        let previous = self.get_config().await?;
        self.store(&previous, config).await
    }

    /// Change the number of series.
    ///
    /// Shrinking below numbers already issued is allowed; those numbers keep
    /// their owners but fall outside the generation range.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` when `series_count` is zero.
    pub async fn update_series(&self, series_count: u32) -> Result<CampaignConfig> {
        self.update(|config| config.series_count = series_count).await
    }

    /// Replace the algorithm section.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the section is invalid.
    pub async fn update_algorithm(&self, algorithm: AlgorithmConfig) -> Result<CampaignConfig> {
        self.update(|config| config.algorithm = algorithm).await
    }

    /// Replace the limits section.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the section is invalid.
    pub async fn update_limits(&self, limits: LimitConfig) -> Result<CampaignConfig> {
        self.update(|config| config.limits = limits).await
    }

    /// Replace the format section.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the section is invalid.
    pub async fn update_format(&self, format: FormatConfig) -> Result<CampaignConfig> {
        self.update(|config| config.format = format).await
    }

    async fn update<F>(&self, apply: F) -> Result<CampaignConfig>
    where
        F: FnOnce(&mut CampaignConfig) + Send,
    {
        let _guard = self.update_lock.lock().await;
        let previous = self.get_config().await?;
        let mut config = previous.clone();
        apply(&mut config);
        self.store(&previous, config).await
    }

    /// Caller must hold `update_lock`.
    async fn store(
        &self,
        previous: &CampaignConfig,
        mut config: CampaignConfig,
    ) -> Result<CampaignConfig> {
        config.validate().map_err(AppError::InvalidConfiguration)?;
        config.updated_at = chrono::Utc::now().timestamp_millis();

        self.storage.save_campaign_config(&config).await?;

        if reseeds_cursor(&previous.algorithm, &config.algorithm) {
            let start = config.algorithm.sequential_start;
            self.storage.set_cursor(SEQUENTIAL_CURSOR, start).await?;
            tracing::info!(start, "Sequential cursor reseeded");
        }

        tracing::info!(
            series_count = config.series_count,
            algorithm = %config.algorithm.algorithm,
            "Campaign configuration updated"
        );
        Ok(config)
    }

    /// Series of the current configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or the stored series count is zero.
    pub async fn series(&self) -> Result<Vec<Series>> {
        let config = self.get_config().await?;
        compute_series(config.series_count)
    }

    /// Render `number` with the current format settings.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn preview_format(&self, number: u64) -> Result<String> {
        let config = self.get_config().await?;
        Ok(format_number(number, &config.format))
    }
}

/// Switching to sequential, or moving its start, restarts the scan there.
fn reseeds_cursor(previous: &AlgorithmConfig, next: &AlgorithmConfig) -> bool {
    next.algorithm == Algorithm::Sequential
        && (previous.algorithm != Algorithm::Sequential
            || previous.sequential_start != next.sequential_start)
}
