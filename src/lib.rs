//! # Lucky Number Worker
//!
//! Issues promotional lucky numbers ("números da sorte") to registered
//! campaign participants:
//!
//! - **Series**: the number space is split into blocks of 100 000 values
//! - **Generation**: random, sequential or timestamp-seeded, never repeating
//! - **Limits**: per-participant lifetime and daily caps plus a global daily cap
//! - **Formatting**: zero padding, check digit, prefix/suffix and display masks
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                           Worker Service                             │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌────────────┐ │
//! │  │   API Layer │  │   Service   │  │   Storage   │  │  Domain    │ │
//! │  │  (Axum)     │→ │   Layer     │→ │   Layer     │  │  Models    │ │
//! │  └─────────────┘  └─────────────┘  └─────────────┘  └────────────┘ │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod storage;

use std::net::SocketAddr;
use std::sync::Arc;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use crate::api::create_router;
use crate::api::state::AppState;
use crate::config::AppConfig;
use crate::storage::create_storage;

/// Run the lucky-number worker service.
///
/// This function:
/// 1. Loads configuration from files and environment
/// 2. Initializes logging and the metrics recorder
/// 3. Initializes the storage backend
/// 4. Starts the HTTP server
/// 5. Handles graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded
/// - Storage backend fails to initialize
/// - HTTP server fails to bind
pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Lucky Number Worker"
    );

    let metrics = init_metrics(&config)?;

    let storage = create_storage(&config.storage).await?;
    info!(backend = %config.storage.backend, "Storage initialized");

    let state = AppState::new(Arc::new(config.clone()), storage, metrics);
    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize logging based on configuration.
fn init_logging(config: &AppConfig) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.observability.log_format == "json" {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber.with(fmt::layer()).init();
    }
}

/// Install the global Prometheus recorder when metrics are enabled.
fn init_metrics(config: &AppConfig) -> anyhow::Result<Option<PrometheusHandle>> {
    if !config.observability.metrics_enabled {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    metrics::describe_counter!(
        "lucky_numbers_issued_total",
        "Lucky numbers issued, by algorithm"
    );
    metrics::describe_counter!(
        "lucky_number_limit_denials_total",
        "Generation requests refused by a limit, by reason"
    );
    metrics::describe_counter!(
        "lucky_number_allocation_conflicts_total",
        "Batches regenerated after a uniqueness conflict"
    );
    metrics::describe_histogram!(
        "lucky_number_allocation_duration_seconds",
        "Time to serve a successful generation request"
    );

    Ok(Some(handle))
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown");
        }
        () = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
