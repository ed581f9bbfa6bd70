//! Ensemble frame classification.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use deepscan_models::FramePrediction;
use tracing::{debug, trace};

use crate::error::{InferenceError, InferenceResult};
use crate::model::classify_image;
use crate::service::{InferenceService, ModelPair};

/// Classifies one sampled frame.
#[async_trait]
pub trait FramePredictor: Send + Sync + 'static {
    /// Make the predictor ready before a run. A failure here is not fatal:
    /// [`predict`](Self::predict) reports it per frame.
    async fn prepare(&self) -> InferenceResult<()> {
        Ok(())
    }

    /// Classify the image at `image_path` captured at `time`.
    ///
    /// Blocking. Never fails: problems are reported in
    /// [`FramePrediction::error`].
    fn predict(&self, image_path: &Path, time: f64) -> FramePrediction;

    /// Called after each batch. Backends that cache per-frame state release
    /// it here. The default does nothing.
    fn reclaim(&self) {}
}

/// Two-model ensemble: FAKE if either model says FAKE, confidence is the
/// mean of both.
///
/// Keeps no per-frame state: the decoded image and input tensors live only
/// for one `predict` call, and the models stay loaded across batches, so
/// `reclaim` is left as the default.
#[derive(Debug, Clone)]
pub struct EnsembleClassifier {
    service: Arc<InferenceService>,
}

impl EnsembleClassifier {
    pub fn new(service: Arc<InferenceService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl FramePredictor for EnsembleClassifier {
    async fn prepare(&self) -> InferenceResult<()> {
        self.service.models().await.map(|_| ())
    }

    fn predict(&self, image_path: &Path, time: f64) -> FramePrediction {
        let Some(models) = self.service.loaded() else {
            let reason = self
                .service
                .failure()
                .unwrap_or_else(|| "models are not loaded".to_string());
            return FramePrediction::failed(time, InferenceError::ModelLoad(reason).to_string());
        };

        match classify_frame(&models, image_path, time) {
            Ok(prediction) => prediction,
            Err(e) => {
                debug!(path = %image_path.display(), time = time, error = %e, "Frame classification failed");
                FramePrediction::failed(time, e.to_string())
            }
        }
    }
}

/// Run both models on one image file.
pub fn classify_frame(
    models: &ModelPair,
    image_path: &Path,
    time: f64,
) -> InferenceResult<FramePrediction> {
    let image = image::open(image_path)?;

    let first = classify_image(models.first.as_ref(), &image)?;
    let second = classify_image(models.second.as_ref(), &image)?;

    trace!(
        time = time,
        model1 = first.0.as_str(),
        model2 = second.0.as_str(),
        "Frame classified"
    );

    Ok(FramePrediction::from_models(time, first, second))
}
