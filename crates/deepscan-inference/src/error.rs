//! Error types for inference.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for inference operations.
pub type InferenceResult<T> = Result<T, InferenceError>;

/// Errors that can occur while loading or running the classifiers.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The inference backend could not be initialized. Classification
    /// degrades to per-frame error payloads.
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Model file not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Failed to read image: {0}")]
    Image(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Unexpected model output: {0}")]
    InvalidOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl InferenceError {
    pub fn model_load(message: impl Into<String>) -> Self {
        Self::ModelLoad(message.into())
    }

    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference(message.into())
    }

    pub fn is_model_load(&self) -> bool {
        matches!(self, Self::ModelLoad(_) | Self::ModelNotFound(_))
    }
}

impl From<image::ImageError> for InferenceError {
    fn from(e: image::ImageError) -> Self {
        Self::Image(e.to_string())
    }
}
