//! Inference Engine - ONNX Runtime Integration
//!
//! Loads the quantized classifier once at startup and maps an image tensor
//! to the scalar sigmoid output. No retries: a failed run is reported as is.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logic::classifier::Probability;
use crate::logic::decoder::ImageTensor;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Model metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_path: String,
    pub input_name: String,
    pub output_name: String,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

/// Engine status for /health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub model_loaded: bool,
    pub model_name: String,
    pub inference_device: String,
    pub avg_latency_ms: f32,
    pub inference_count: u64,
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Failed to load model: {0}")]
    Load(String),

    #[error("Inference failed: {0}")]
    Run(String),

    #[error("Model produced no output")]
    EmptyOutput,

    #[error("Model output {0} is not a probability")]
    InvalidOutput(f32),
}

// ============================================================================
// INFERENCE ENGINE TRAIT
// ============================================================================

/// Backend able to score one preprocessed image
pub trait InferenceEngine: Send + Sync {
    fn infer(&self, tensor: &ImageTensor) -> Result<Probability, InferenceError>;

    /// Short description shown in /health
    fn name(&self) -> String;

    fn device(&self) -> &str {
        "CPU"
    }
}

// ============================================================================
// ONNX IMPLEMENTATION
// ============================================================================

pub struct OnnxEngine {
    session: Mutex<Session>,
    metadata: ModelMetadata,
}

impl OnnxEngine {
    /// Load ONNX model from file
    pub fn load(model_path: &str) -> Result<Self, InferenceError> {
        tracing::info!("Loading ONNX model from: {}", model_path);

        if !Path::new(model_path).exists() {
            return Err(InferenceError::ModelNotFound(model_path.to_string()));
        }

        let session = Session::builder()
            .map_err(|e| InferenceError::Load(format!("session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| InferenceError::Load(format!("optimization level: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| InferenceError::Load(e.to_string()))?;

        let input_name = session.inputs.first()
            .map(|i| i.name.clone())
            .ok_or_else(|| InferenceError::Load("model declares no input".to_string()))?;
        let output_name = session.outputs.first()
            .map(|o| o.name.clone())
            .ok_or_else(|| InferenceError::Load("model declares no output".to_string()))?;

        tracing::info!("✅ ONNX model loaded (input: {}, output: {})", input_name, output_name);

        Ok(Self {
            session: Mutex::new(session),
            metadata: ModelMetadata {
                model_path: model_path.to_string(),
                input_name,
                output_name,
                loaded_at: chrono::Utc::now(),
            },
        })
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}

impl InferenceEngine for OnnxEngine {
    fn infer(&self, tensor: &ImageTensor) -> Result<Probability, InferenceError> {
        let input = Value::from_array(tensor.clone())
            .map_err(|e| InferenceError::Run(format!("tensor: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session.run(ort::inputs![input])
            .map_err(|e| InferenceError::Run(e.to_string()))?;

        let output = outputs.get(&self.metadata.output_name)
            .ok_or(InferenceError::EmptyOutput)?;
        let (_, data) = output.try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::Run(format!("extract: {}", e)))?;

        let raw = data.first().copied().ok_or(InferenceError::EmptyOutput)?;
        Probability::new(raw as f64).map_err(|_| InferenceError::InvalidOutput(raw))
    }

    fn name(&self) -> String {
        self.metadata.model_path.clone()
    }

    fn device(&self) -> &str {
        "ONNX Runtime (CPU)"
    }
}

// ============================================================================
// HANDLE (engine + latency stats)
// ============================================================================

/// Loaded engine shared by all requests, with latency bookkeeping
pub struct ModelHandle {
    engine: Box<dyn InferenceEngine>,
    latency_sum_us: AtomicU64,
    inference_count: AtomicU64,
}

impl ModelHandle {
    pub fn new(engine: Box<dyn InferenceEngine>) -> Self {
        Self {
            engine,
            latency_sum_us: AtomicU64::new(0),
            inference_count: AtomicU64::new(0),
        }
    }

    /// Blocking; call from a blocking-capable thread
    pub fn infer(&self, tensor: &ImageTensor) -> Result<Probability, InferenceError> {
        let start = Instant::now();
        let result = self.engine.infer(tensor);

        self.latency_sum_us.fetch_add(start.elapsed().as_micros() as u64, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);

        result
    }

    pub fn status(&self) -> EngineStatus {
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.inference_count.load(Ordering::Relaxed);
        let avg = if count > 0 { (sum as f32 / count as f32) / 1000.0 } else { 0.0 };

        EngineStatus {
            model_loaded: true,
            model_name: self.engine.name(),
            inference_device: self.engine.device().to_string(),
            avg_latency_ms: avg,
            inference_count: count,
        }
    }
}
