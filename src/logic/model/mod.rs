//! Model Module - Inference Engine
//!
//! Keeps inference apart from decoding and classification so the model
//! backend can be swapped (ONNX today, mocks in tests).

pub mod inference;

pub use inference::{
    EngineStatus,
    InferenceEngine,
    InferenceError,
    ModelHandle,
    ModelMetadata,
    OnnxEngine,
};
