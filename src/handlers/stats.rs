//! Stats handler

use axum::{extract::State, Json};

use crate::logic::storage::tally;
use crate::models::StatsResponse;
use crate::{AppResult, AppState};

/// Prediction counts over everything stored in the folder
pub async fn stats(State(state): State<AppState>) -> AppResult<Json<StatsResponse>> {
    let storage = state.storage()?;
    let files = storage.gateway.list(&storage.folder_id).await?;

    Ok(Json(StatsResponse::new(tally(&files), storage.folder_id.clone())))
}
