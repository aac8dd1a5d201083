//! Upload model

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::logic::storage::{PredictionSnapshot, UploadResult};

#[derive(Debug, Deserialize, Validate)]
pub struct UploadRequest {
    /// Data URL or raw base64
    pub image: Option<String>,

    #[serde(default)]
    #[validate(nested)]
    pub prediction: PredictionSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub file_id: String,
    pub file_name: String,
    pub web_link: Option<String>,
}

impl From<UploadResult> for UploadResponse {
    fn from(result: UploadResult) -> Self {
        Self {
            success: true,
            file_id: result.file_id,
            file_name: result.file_name,
            web_link: result.web_link,
        }
    }
}
