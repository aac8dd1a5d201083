//! Health check handler

use axum::{extract::State, Json};

use crate::models::HealthResponse;
use crate::AppState;

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let engine = state.model.as_ref().map(|m| m.status());

    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "Oral Cancer Detection API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Local::now().to_rfc3339(),
        model_loaded: engine.is_some(),
        drive_connected: state.storage.is_some(),
        policy: state.classifier.policy().name().to_string(),
        engine,
    })
}
