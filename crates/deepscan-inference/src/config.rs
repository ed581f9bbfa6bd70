//! Inference configuration.

use std::path::PathBuf;
use std::str::FromStr;

/// Execution device for the classifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    #[default]
    Cpu,
    Cuda,
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "cuda" | "gpu" => Ok(Self::Cuda),
            other => Err(format!("Unknown inference device: {}", other)),
        }
    }
}

/// Inference configuration.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Primary deepfake classifier (ONNX)
    pub model1_path: PathBuf,
    /// Secondary classifier (ONNX); unused when the CPU shares one model
    pub model2_path: PathBuf,
    /// `config.json` with `id2label`; defaults to the file next to the model
    pub model1_labels: Option<PathBuf>,
    pub model2_labels: Option<PathBuf>,
    /// Square input size in pixels
    pub input_size: u32,
    pub device: Device,
    /// Load one model and use it in both slots when running on CPU
    pub share_model_on_cpu: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            model1_path: PathBuf::from("models/deepfake_detector_v2/model.onnx"),
            model2_path: PathBuf::from("models/vit_base_patch16_224/model.onnx"),
            model1_labels: None,
            model2_labels: None,
            input_size: 224,
            device: Device::Cpu,
            share_model_on_cpu: true,
        }
    }
}

impl InferenceConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            model1_path: std::env::var("MODEL1_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model1_path),
            model2_path: std::env::var("MODEL2_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model2_path),
            model1_labels: std::env::var("MODEL1_LABELS_PATH").ok().map(PathBuf::from),
            model2_labels: std::env::var("MODEL2_LABELS_PATH").ok().map(PathBuf::from),
            input_size: std::env::var("MODEL_INPUT_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n: &u32| n > 0)
                .unwrap_or(defaults.input_size),
            device: std::env::var("INFERENCE_DEVICE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.device),
            share_model_on_cpu: std::env::var("SHARE_MODEL_ON_CPU")
                .map(|s| s != "false" && s != "0")
                .unwrap_or(defaults.share_model_on_cpu),
        }
    }

    /// Whether a single model instance fills both ensemble slots.
    pub fn shares_single_model(&self) -> bool {
        self.device == Device::Cpu && self.share_model_on_cpu
    }

    /// Label config path for a model: explicit override or `config.json` beside it.
    pub fn labels_path(model_path: &std::path::Path, explicit: Option<&PathBuf>) -> PathBuf {
        explicit.cloned().unwrap_or_else(|| {
            model_path
                .parent()
                .map(|dir| dir.join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
    }
}
