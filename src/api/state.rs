//! Application state for Axum handlers.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::AppConfig;
use crate::service::{AllocationService, CampaignService, ParticipantService};
use crate::storage::traits::Storage;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Storage backend.
    pub storage: Arc<dyn Storage>,
    /// Campaign configuration service.
    pub campaign_service: Arc<CampaignService>,
    /// Participant registry service.
    pub participant_service: Arc<ParticipantService>,
    /// Number allocation service.
    pub allocation_service: Arc<AllocationService>,
    /// Prometheus exporter, when metrics are enabled.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        config: Arc<AppConfig>,
        storage: Arc<dyn Storage>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        let campaign_service = Arc::new(CampaignService::new(Arc::clone(&storage)));
        let participant_service = Arc::new(ParticipantService::new(Arc::clone(&storage)));
        let allocation_service = Arc::new(AllocationService::new(
            Arc::clone(&storage),
            &config.generation,
        ));

        Self {
            config,
            storage,
            campaign_service,
            participant_service,
            allocation_service,
            metrics,
        }
    }
}
