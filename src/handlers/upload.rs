//! Upload handler

use axum::{extract::{rejection::JsonRejection, State}, Json};
use chrono::Local;
use validator::Validate;

use crate::logic::decoder::decode_base64;
use crate::logic::storage::{UploadRecord, UploadResult};
use crate::models::{UploadRequest, UploadResponse};
use crate::{AppError, AppResult, AppState};

/// Store an image with a client-supplied prediction
pub async fn upload(
    State(state): State<AppState>,
    payload: Result<Json<UploadRequest>, JsonRejection>,
) -> AppResult<Json<UploadResponse>> {
    let Json(req) = payload?;
    req.validate()?;

    let image = req.image
        .filter(|s| !s.trim().is_empty())
        .ok_or(AppError::MissingImage)?;
    let bytes = decode_base64(&image)?;

    let record = UploadRecord::new(bytes, req.prediction, Local::now());
    let result = store_record(&state, record).await?;

    Ok(Json(result.into()))
}

/// Upload one record into the configured folder
pub(crate) async fn store_record(state: &AppState, record: UploadRecord) -> AppResult<UploadResult> {
    let storage = state.storage()?;
    let metadata = record.metadata();

    tracing::debug!("Uploading {} ({} bytes)", record.filename, record.bytes.len());
    let result = storage.gateway
        .upload(&storage.folder_id, record.bytes, &record.filename, &metadata)
        .await?;

    Ok(result)
}
