//! Health model

use serde::{Deserialize, Serialize};

use crate::logic::model::EngineStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
    pub model_loaded: bool,
    pub drive_connected: bool,
    pub policy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<EngineStatus>,
}
