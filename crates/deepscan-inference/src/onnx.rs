//! ONNX Runtime image classifiers.
//!
//! Models are Hugging Face image classifiers exported to ONNX. Labels come
//! from the exported `config.json` (`id2label`). Execution provider is
//! chosen at load time:
//! - CUDA on Linux with NVIDIA GPU (when the `cuda` feature is enabled)
//! - CPU fallback on all platforms

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use image::DynamicImage;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::{Device, InferenceConfig};
use crate::error::{InferenceError, InferenceResult};
use crate::model::ImageModel;
use crate::service::{ModelLoader, ModelPair};

/// Per-channel normalization used by ViT image processors.
const IMAGE_MEAN: [f32; 3] = [0.5, 0.5, 0.5];
const IMAGE_STD: [f32; 3] = [0.5, 0.5, 0.5];

/// The subset of a Hugging Face `config.json` we read.
#[derive(Debug, Deserialize)]
struct LabelConfig {
    #[serde(default)]
    id2label: BTreeMap<String, String>,
}

/// Parse `id2label` from a Hugging Face model config.
pub fn parse_id2label(json: &str) -> InferenceResult<BTreeMap<usize, String>> {
    let config: LabelConfig = serde_json::from_str(json)?;
    config
        .id2label
        .into_iter()
        .map(|(id, label)| {
            id.parse::<usize>()
                .map(|id| (id, label))
                .map_err(|_| InferenceError::InvalidOutput(format!("Bad id2label key: {}", id)))
        })
        .collect()
}

/// Image classifier backed by an ONNX Runtime session.
pub struct OnnxImageClassifier {
    name: String,
    session: Mutex<Session>,
    output_name: String,
    id2label: BTreeMap<usize, String>,
    input_size: u32,
}

impl OnnxImageClassifier {
    /// Load a model and its label config.
    pub fn load(
        model_path: &Path,
        labels_path: &Path,
        input_size: u32,
        device: Device,
    ) -> InferenceResult<Self> {
        if !model_path.exists() {
            return Err(InferenceError::ModelNotFound(model_path.to_path_buf()));
        }

        let id2label = if labels_path.exists() {
            parse_id2label(&std::fs::read_to_string(labels_path)?)?
        } else {
            debug!(path = %labels_path.display(), "No label config, using index labels");
            BTreeMap::new()
        };

        let session = create_session(model_path, device)?;
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| InferenceError::model_load("Model has no outputs"))?;

        let name = model_path
            .parent()
            .and_then(|p| p.file_name())
            .or_else(|| model_path.file_stem())
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "model".to_string());

        info!(
            model = %name,
            model_path = %model_path.display(),
            labels = ?id2label,
            input_size = input_size,
            "Image classifier loaded"
        );

        Ok(Self {
            name,
            session: Mutex::new(session),
            output_name,
            id2label,
            input_size,
        })
    }

    /// Resize, normalize and lay out as NCHW `[1, 3, H, W]`.
    fn preprocess(&self, img: &DynamicImage) -> InferenceResult<Value> {
        let size = self.input_size;
        let data = image_to_chw(img, size);
        let shape = vec![1usize, 3, size as usize, size as usize];
        Tensor::from_array((shape, data.into_boxed_slice()))
            .map(Value::from)
            .map_err(|e| InferenceError::inference(format!("Failed to create tensor: {}", e)))
    }
}

impl ImageModel for OnnxImageClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn logits(&self, image: &DynamicImage) -> InferenceResult<Vec<f32>> {
        let input = self.preprocess(image)?;

        let mut session = lock_session(&self.session);

        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| InferenceError::inference(format!("ONNX inference failed: {}", e)))?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            InferenceError::InvalidOutput(format!("Missing {} tensor", self.output_name))
        })?;

        let tensor = output
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::InvalidOutput(format!("Failed to extract tensor: {}", e)))?;

        Ok(tensor.1.iter().copied().collect())
    }

    fn label(&self, class_index: usize) -> Option<&str> {
        self.id2label.get(&class_index).map(String::as_str)
    }
}

/// Lock a session. A panic inside an earlier `run` only fails that frame:
/// the poisoned guard is recovered and the session stays usable.
fn lock_session<T>(session: &Mutex<T>) -> MutexGuard<'_, T> {
    session.lock().unwrap_or_else(|poisoned| {
        warn!("Recovering ONNX session lock after a panicked inference");
        session.clear_poison();
        poisoned.into_inner()
    })
}

/// RGB pixels as normalized CHW floats at `size × size`.
fn image_to_chw(img: &DynamicImage, size: u32) -> Vec<f32> {
    let resized = img.resize_exact(size, size, image::imageops::FilterType::Triangle);
    let rgb = resized.to_rgb8();
    let (w, h) = (size as usize, size as usize);

    let mut chw = Vec::with_capacity(3 * h * w);
    for c in 0..3 {
        for y in 0..h {
            for x in 0..w {
                let pixel = rgb.get_pixel(x as u32, y as u32);
                chw.push((pixel[c] as f32 / 255.0 - IMAGE_MEAN[c]) / IMAGE_STD[c]);
            }
        }
    }
    chw
}

fn create_session(model_path: &Path, device: Device) -> InferenceResult<Session> {
    let model_bytes = std::fs::read(model_path)?;

    let builder = Session::builder()
        .map_err(|e| InferenceError::model_load(format!("Failed to create session builder: {}", e)))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| InferenceError::model_load(format!("Failed to set optimization level: {}", e)))?;

    #[cfg(all(target_os = "linux", feature = "cuda"))]
    {
        use ort::execution_providers::CUDAExecutionProvider;
        if device == Device::Cuda {
            if let Ok(cuda_builder) = builder
                .clone()
                .with_execution_providers([CUDAExecutionProvider::default().build()])
            {
                if let Ok(session) = cuda_builder.commit_from_memory(&model_bytes) {
                    info!("Using CUDA execution provider");
                    return Ok(session);
                }
            }
            debug!("CUDA execution provider not available, using CPU");
        }
    }

    if device == Device::Cuda && !cfg!(feature = "cuda") {
        debug!("Built without CUDA support, using CPU");
    }

    builder
        .commit_from_memory(&model_bytes)
        .map_err(|e| InferenceError::model_load(format!("Failed to load ONNX model: {}", e)))
}

/// [`ModelLoader`] that builds both classifiers from an [`InferenceConfig`].
#[derive(Debug, Clone)]
pub struct OnnxModelLoader {
    config: InferenceConfig,
}

impl OnnxModelLoader {
    pub fn new(config: InferenceConfig) -> Self {
        Self { config }
    }
}

impl ModelLoader for OnnxModelLoader {
    fn load(&self) -> InferenceResult<ModelPair> {
        let c = &self.config;

        let first: Arc<dyn ImageModel> = Arc::new(OnnxImageClassifier::load(
            &c.model1_path,
            &InferenceConfig::labels_path(&c.model1_path, c.model1_labels.as_ref()),
            c.input_size,
            c.device,
        )?);

        if c.shares_single_model() {
            info!("CPU mode: sharing one model in both ensemble slots");
            return Ok(ModelPair::shared(first));
        }

        let second: Arc<dyn ImageModel> = Arc::new(OnnxImageClassifier::load(
            &c.model2_path,
            &InferenceConfig::labels_path(&c.model2_path, c.model2_labels.as_ref()),
            c.input_size,
            c.device,
        )?);

        Ok(ModelPair::new(first, second))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    #[test]
    fn test_parse_id2label() {
        let json = r#"{"architectures": ["ViTForImageClassification"],
                       "id2label": {"0": "Realism", "1": "Deepfake"}}"#;
        let labels = parse_id2label(json).unwrap();
        assert_eq!(labels.get(&0).map(String::as_str), Some("Realism"));
        assert_eq!(labels.get(&1).map(String::as_str), Some("Deepfake"));
    }

    #[test]
    fn test_parse_id2label_missing_map() {
        assert!(parse_id2label("{}").unwrap().is_empty());
        assert!(parse_id2label(r#"{"id2label": {"x": "FAKE"}}"#).is_err());
    }

    #[test]
    fn test_image_to_chw_normalizes() {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(8, 8, Rgb([255, 0, 255]));
        let chw = image_to_chw(&DynamicImage::ImageRgb8(img), 4);

        assert_eq!(chw.len(), 3 * 4 * 4);
        // R plane = 1.0, G plane = -1.0, B plane = 1.0
        assert!((chw[0] - 1.0).abs() < 1e-6);
        assert!((chw[16] + 1.0).abs() < 1e-6);
        assert!((chw[32] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_load_missing_model() {
        let err = OnnxImageClassifier::load(
            Path::new("/no/such/model.onnx"),
            Path::new("/no/such/config.json"),
            224,
            Device::Cpu,
        )
        .err()
        .unwrap();
        assert!(err.is_model_load());
    }

    #[test]
    fn test_poisoned_session_lock_is_recovered() {
        let session = Arc::new(Mutex::new(0u32));

        let poisoner = Arc::clone(&session);
        let joined = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("inference panicked");
        })
        .join();
        assert!(joined.is_err());
        assert!(session.is_poisoned());

        *lock_session(&session) += 1;
        *lock_session(&session) += 1;

        assert_eq!(*lock_session(&session), 2);
        assert!(!session.is_poisoned());
    }
}
