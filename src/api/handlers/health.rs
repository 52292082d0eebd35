//! Health check handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::api::state::AppState;
use crate::error::ErrorCode;

/// Liveness probe - always returns 200 if the service is running.
pub async fn health() -> Json<Value> {
    Json(json!({
        "code": 0,
        "message": "success",
        "data": {
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}

/// Readiness probe - checks if the service can serve requests.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let storage_ok = match state.storage.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, backend = state.storage.backend_name(), "Storage not ready");
            false
        }
    };

    let status_code = if storage_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = Json(json!({
        "code": if storage_ok { 0 } else { ErrorCode::SERVICE_UNAVAILABLE.as_i32() },
        "message": if storage_ok { "success" } else { "service unavailable" },
        "data": {
            "ready": storage_ok,
            "components": {
                "storage": {
                    "backend": state.storage.backend_name(),
                    "healthy": storage_ok
                }
            }
        }
    }));

    (status_code, response)
}

/// Prometheus metrics endpoint.
pub async fn metrics(State(state): State<AppState>) -> (StatusCode, String) {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::NOT_FOUND,
            "# metrics disabled\n".to_string(),
        ),
    }
}
