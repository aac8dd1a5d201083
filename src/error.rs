//! Error handling

use axum::{
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::logic::classifier::ClassifyError;
use crate::logic::decoder::DecodeError;
use crate::logic::model::InferenceError;
use crate::logic::storage::StorageError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    // Request errors
    #[error("No image data provided")]
    MissingImage,

    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    DecodeError(String),

    // Capability errors (startup left the dependency unavailable)
    #[error("Model not loaded")]
    ModelUnavailable,

    #[error("Drive service not initialized")]
    StorageUnavailable,

    // Pipeline errors
    #[error("Prediction failed: {0}")]
    PredictionFailed(String),

    // External service errors
    #[error("Storage error: {0}")]
    ExternalServiceError(String),

    // Generic errors
    #[error("Internal server error")]
    InternalError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingImage
            | AppError::ValidationError(_)
            | AppError::DecodeError(_) => StatusCode::BAD_REQUEST,
            AppError::ModelUnavailable | AppError::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::PredictionFailed(_) | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::PredictionFailed(msg) => tracing::error!("Prediction failed: {}", msg),
            AppError::ExternalServiceError(msg) => tracing::error!("External service error: {}", msg),
            AppError::InternalError(msg) => tracing::error!("Internal error: {}", msg),
            other => tracing::debug!("Request rejected: {}", other),
        }

        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<DecodeError> for AppError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Empty => AppError::MissingImage,
            other => AppError::DecodeError(other.to_string()),
        }
    }
}

impl From<InferenceError> for AppError {
    fn from(err: InferenceError) -> Self {
        AppError::PredictionFailed(err.to_string())
    }
}

impl From<ClassifyError> for AppError {
    fn from(err: ClassifyError) -> Self {
        AppError::PredictionFailed(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::ExternalServiceError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(format!("Invalid prediction: {}", err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::ValidationError(err.body_text())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(err.to_string())
    }
}
