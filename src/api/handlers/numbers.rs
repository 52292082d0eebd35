//! Lucky-number handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::api::handlers::participants::DocumentQuery;
use crate::api::state::AppState;
use crate::domain::{
    Allocation, ApiResponse, FormatPreviewResponse, GenerateRequest, ParticipantNumbersResponse,
};
use crate::error::Result;

/// Query parameters for the format preview.
#[derive(Debug, Deserialize)]
pub struct FormatQuery {
    /// Raw number to render.
    pub number: u64,
}

/// Issue lucky numbers to a participant.
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<ApiResponse<Allocation>>> {
    let allocation = state
        .allocation_service
        .allocate(&request.document, request.quantity)
        .await?;
    Ok(Json(ApiResponse::success(allocation)))
}

/// List a participant's numbers.
pub async fn list_numbers(
    State(state): State<AppState>,
    Query(query): Query<DocumentQuery>,
) -> Result<Json<ApiResponse<ParticipantNumbersResponse>>> {
    let numbers = state.allocation_service.list_numbers(&query.document).await?;
    Ok(Json(ApiResponse::success(numbers)))
}

/// Render a number with the current format settings.
pub async fn format_preview(
    State(state): State<AppState>,
    Query(query): Query<FormatQuery>,
) -> Result<Json<ApiResponse<FormatPreviewResponse>>> {
    let formatted = state.campaign_service.preview_format(query.number).await?;
    Ok(Json(ApiResponse::success(FormatPreviewResponse {
        number: query.number,
        formatted,
    })))
}
