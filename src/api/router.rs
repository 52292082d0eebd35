//! Router setup and configuration.

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::api::handlers::{campaign, health, numbers, participants};
use crate::api::middleware::auth::require_admin;
use crate::api::state::AppState;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    // Health and metrics routes (no auth required)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/metrics", get(health::metrics));

    let campaign_routes = Router::new()
        .route(
            "/config",
            get(campaign::get_config).put(campaign::replace_config),
        )
        .route("/config/series", put(campaign::update_series))
        .route("/config/algorithm", put(campaign::update_algorithm))
        .route("/config/limits", put(campaign::update_limits))
        .route("/config/format", put(campaign::update_format))
        .route("/series", get(campaign::get_series))
        .route("/series/preview", get(campaign::preview_series));

    let participant_routes = Router::new().route(
        "/",
        post(participants::register).get(participants::get_participant),
    );

    let number_routes = Router::new()
        .route("/", get(numbers::list_numbers))
        .route("/generate", post(numbers::generate))
        .route("/format", get(numbers::format_preview));

    // Everything under /v1 requires the admin token
    let v1_routes = Router::new()
        .nest("/campaign", campaign_routes)
        .nest("/participants", participant_routes)
        .nest("/numbers", number_routes)
        .layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
