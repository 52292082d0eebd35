//! Campaign configuration handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::api::state::AppState;
use crate::domain::{
    AlgorithmConfig, ApiResponse, CampaignConfig, FormatConfig, LimitConfig, SeriesResponse,
    SeriesUpdate,
};
use crate::error::{AppError, Result};
use crate::service::{compute_series, total_capacity};

/// Largest series count the preview endpoint will lay out.
const MAX_PREVIEW_SERIES: u32 = 1000;

/// Query parameters for the series preview.
#[derive(Debug, Deserialize)]
pub struct SeriesPreviewQuery {
    /// Series count to lay out.
    pub count: u32,
}

fn series_response(series_count: u32) -> Result<SeriesResponse> {
    Ok(SeriesResponse {
        series_count,
        total_numbers: total_capacity(series_count),
        series: compute_series(series_count)?,
    })
}

/// Get the campaign configuration.
pub async fn get_config(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CampaignConfig>>> {
    let config = state.campaign_service.get_config().await?;
    Ok(Json(ApiResponse::success(config)))
}

/// Replace the whole campaign configuration.
pub async fn replace_config(
    State(state): State<AppState>,
    Json(config): Json<CampaignConfig>,
) -> Result<Json<ApiResponse<CampaignConfig>>> {
    let config = state.campaign_service.replace_config(config).await?;
    Ok(Json(ApiResponse::success(config)))
}

/// Change the series count.
pub async fn update_series(
    State(state): State<AppState>,
    Json(update): Json<SeriesUpdate>,
) -> Result<Json<ApiResponse<CampaignConfig>>> {
    let config = state
        .campaign_service
        .update_series(update.series_count)
        .await?;
    Ok(Json(ApiResponse::success(config)))
}

/// Replace the algorithm section.
pub async fn update_algorithm(
    State(state): State<AppState>,
    Json(algorithm): Json<AlgorithmConfig>,
) -> Result<Json<ApiResponse<CampaignConfig>>> {
    let config = state.campaign_service.update_algorithm(algorithm).await?;
    Ok(Json(ApiResponse::success(config)))
}

/// Replace the limits section.
pub async fn update_limits(
    State(state): State<AppState>,
    Json(limits): Json<LimitConfig>,
) -> Result<Json<ApiResponse<CampaignConfig>>> {
    let config = state.campaign_service.update_limits(limits).await?;
    Ok(Json(ApiResponse::success(config)))
}

/// Replace the format section.
pub async fn update_format(
    State(state): State<AppState>,
    Json(format): Json<FormatConfig>,
) -> Result<Json<ApiResponse<CampaignConfig>>> {
    let config = state.campaign_service.update_format(format).await?;
    Ok(Json(ApiResponse::success(config)))
}

/// Series of the stored configuration.
pub async fn get_series(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SeriesResponse>>> {
    let config = state.campaign_service.get_config().await?;
    Ok(Json(ApiResponse::success(series_response(
        config.series_count,
    )?)))
}

/// Lay out `count` series without saving anything.
pub async fn preview_series(
    Query(query): Query<SeriesPreviewQuery>,
) -> Result<Json<ApiResponse<SeriesResponse>>> {
    if query.count > MAX_PREVIEW_SERIES {
        return Err(AppError::BadRequest(format!(
            "count cannot exceed {MAX_PREVIEW_SERIES}"
        )));
    }
    Ok(Json(ApiResponse::success(series_response(query.count)?)))
}
