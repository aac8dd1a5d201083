//! OralScan - Oral Lesion Screening Service
//!
//! Classifies oral cavity photographs with a binary CNN and optionally keeps
//! each image, labelled with its prediction, in a remote training-data folder.
//!
//! # Architecture
//!
//! ```text
//!  POST /predict   base64 -> Decoder -> Inference (ONNX) -> Classifier -> JSON
//!                                                              |
//!                                                   store=true v
//!  POST /upload    base64 + prediction ----------------------> Storage (Drive)
//!  GET  /stats     folder listing <------------------------------'
//!  GET  /health
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod logic;
pub mod models;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use error::{AppError, AppResult};

use config::Config;
use logic::classifier::Classifier;
use logic::decoder::ImageDecoder;
use logic::model::ModelHandle;
use logic::storage::{FolderId, StorageGateway};

/// Connected storage backend plus the resolved upload folder
#[derive(Clone)]
pub struct StorageContext {
    pub gateway: Arc<dyn StorageGateway>,
    pub folder_id: FolderId,
}

/// Shared application state, built once at startup.
///
/// `model` and `storage` are `None` when startup could not bring them up;
/// the endpoints that need them answer 503 instead.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub classifier: Arc<Classifier>,
    pub decoder: ImageDecoder,
    pub model: Option<Arc<ModelHandle>>,
    pub storage: Option<StorageContext>,
}

impl AppState {
    pub fn model(&self) -> AppResult<Arc<ModelHandle>> {
        self.model.clone().ok_or(AppError::ModelUnavailable)
    }

    pub fn storage(&self) -> AppResult<&StorageContext> {
        self.storage.as_ref().ok_or(AppError::StorageUnavailable)
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.body_limit_bytes();

    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/predict", post(handlers::predict::predict))
        .route("/upload", post(handlers::upload::upload))
        .route("/stats", get(handlers::stats::stats))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
