//! Prediction handler
//!
//! decode -> infer -> classify, with an optional upload of the image.

use axum::{extract::{rejection::JsonRejection, State}, Json};
use chrono::Local;

use crate::logic::classifier::Probability;
use crate::logic::decoder::decode_base64;
use crate::logic::storage::{PredictionSnapshot, UploadRecord};
use crate::models::{PredictRequest, PredictResponse, StoreOutcome};
use crate::{AppError, AppResult, AppState};

use super::upload::store_record;

pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> AppResult<Json<PredictResponse>> {
    let Json(req) = payload?;
    let model = state.model()?;

    let image = req.image
        .filter(|s| !s.trim().is_empty())
        .ok_or(AppError::MissingImage)?;
    let bytes = decode_base64(&image)?;

    // Image decoding and ONNX inference are CPU bound
    let decoder = state.decoder;
    let (bytes, probability) = tokio::task::spawn_blocking(move || -> AppResult<(Vec<u8>, Probability)> {
        let tensor = decoder.to_tensor(&bytes)?;
        let probability = model.infer(&tensor)?;
        Ok((bytes, probability))
    })
    .await??;

    let diagnosis = state.classifier.classify(probability)?;
    tracing::info!(
        "Prediction: p={:.4} -> {} ({}%, zone {})",
        probability.value(),
        diagnosis.label(),
        diagnosis.confidence(),
        diagnosis.zone()
    );

    let mut response = PredictResponse::from(&diagnosis);

    if req.store {
        let record = UploadRecord::new(bytes, PredictionSnapshot::from(&diagnosis), Local::now());
        let outcome = match store_record(&state, record).await {
            Ok(result) => StoreOutcome {
                success: true,
                result: Some(result),
                error: None,
            },
            Err(e) => {
                tracing::warn!("Prediction kept, upload failed: {}", e);
                StoreOutcome {
                    success: false,
                    result: None,
                    error: Some(e.to_string()),
                }
            }
        };
        response.upload = Some(outcome);
    }

    Ok(Json(response))
}
