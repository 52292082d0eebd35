//! Participant handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::api::state::AppState;
use crate::domain::{ApiResponse, Participant, RegisterParticipantRequest};
use crate::error::Result;

/// Query by document.
#[derive(Debug, Deserialize)]
pub struct DocumentQuery {
    /// CPF/CNPJ, punctuation allowed.
    pub document: String,
}

/// Register a participant.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterParticipantRequest>,
) -> Result<Json<ApiResponse<Participant>>> {
    let participant = state.participant_service.register(request).await?;
    Ok(Json(ApiResponse::success(participant)))
}

/// Look up a participant.
pub async fn get_participant(
    State(state): State<AppState>,
    Query(query): Query<DocumentQuery>,
) -> Result<Json<ApiResponse<Participant>>> {
    let participant = state.participant_service.get(&query.document).await?;
    Ok(Json(ApiResponse::success(participant)))
}
