//! Prediction model

use serde::{Deserialize, Serialize};

use crate::logic::classifier::Diagnosis;
use crate::logic::storage::UploadResult;

/// Held-out evaluation figures of the deployed model (percent)
pub const MODEL_ACCURACY: f64 = 85.71;
pub const MODEL_SENSITIVITY: f64 = 84.35;
pub const MODEL_SPECIFICITY: f64 = 86.92;

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    /// Data URL or raw base64
    pub image: Option<String>,

    /// Also upload the image with the resulting diagnosis
    #[serde(default)]
    pub store: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInfo {
    pub accuracy: f64,
    pub sensitivity: f64,
    pub specificity: f64,
}

impl Default for ModelInfo {
    fn default() -> Self {
        Self {
            accuracy: MODEL_ACCURACY,
            sensitivity: MODEL_SENSITIVITY,
            specificity: MODEL_SPECIFICITY,
        }
    }
}

/// Outcome of the optional store step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreOutcome {
    pub success: bool,
    #[serde(flatten)]
    pub result: Option<UploadResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub success: bool,
    /// Raw model output (p(non-cancer))
    pub prediction_value: f64,
    pub diagnosis: String,
    /// Percent
    pub confidence: f64,
    pub risk_level: String,
    pub recommendation: String,
    pub classification: String,
    pub model_info: ModelInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload: Option<StoreOutcome>,
}

impl From<&Diagnosis> for PredictResponse {
    fn from(diagnosis: &Diagnosis) -> Self {
        Self {
            success: true,
            prediction_value: diagnosis.probability().value(),
            diagnosis: diagnosis.label().to_string(),
            confidence: diagnosis.confidence(),
            risk_level: diagnosis.risk_level().as_str().to_string(),
            recommendation: diagnosis.advisory().to_string(),
            classification: diagnosis.classification().as_str().to_string(),
            model_info: ModelInfo::default(),
            upload: None,
        }
    }
}
