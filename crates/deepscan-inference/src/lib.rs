//! Frame classification for deepfake detection.
//!
//! This crate provides:
//! - [`ImageModel`]: a single image classifier (ONNX backend in [`onnx`])
//! - [`InferenceService`]: process-wide owner of the two models, loaded once on first use
//! - [`EnsembleClassifier`]: fuses both model verdicts into a [`FramePrediction`]
//!
//! [`FramePrediction`]: deepscan_models::FramePrediction

pub mod classifier;
pub mod config;
pub mod error;
pub mod model;
pub mod onnx;
pub mod service;

pub use classifier::{EnsembleClassifier, FramePredictor};
pub use config::{Device, InferenceConfig};
pub use error::{InferenceError, InferenceResult};
pub use model::{classify_image, softmax, ImageModel};
pub use onnx::{OnnxImageClassifier, OnnxModelLoader};
pub use service::{InferenceService, ModelLoader, ModelPair, ServiceStatus};
