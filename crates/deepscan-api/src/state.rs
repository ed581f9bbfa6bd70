//! Application state.

use std::sync::Arc;

use deepscan_inference::{EnsembleClassifier, InferenceConfig, InferenceService, OnnxModelLoader};
use deepscan_media::{FfmpegFrameSampler, FfprobeProber, SileroAudioAnalyzer};
use deepscan_pipeline::{AnalysisPipeline, PipelineConfig};
use deepscan_storage::{AnalysisStore, LocalAnalysisStore};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: AnalysisPipeline,
    pub store: Arc<dyn AnalysisStore>,
    /// Model owner, reported by the readiness probe
    pub inference: Option<Arc<InferenceService>>,
}

impl AppState {
    /// Wire the production components.
    pub fn new(
        config: ApiConfig,
        pipeline_config: PipelineConfig,
        inference_config: InferenceConfig,
    ) -> Self {
        let store: Arc<dyn AnalysisStore> =
            Arc::new(LocalAnalysisStore::new(pipeline_config.results_dir.clone()));
        let ffmpeg_timeout = pipeline_config.ffmpeg_timeout;
        let inference = Arc::new(InferenceService::new(OnnxModelLoader::new(inference_config)));

        let pipeline = AnalysisPipeline::new(
            pipeline_config,
            Arc::new(FfprobeProber),
            Arc::new(FfmpegFrameSampler::new().with_timeout(ffmpeg_timeout)),
            Arc::new(EnsembleClassifier::new(Arc::clone(&inference))),
            Arc::new(SileroAudioAnalyzer::default().with_timeout(ffmpeg_timeout)),
            Arc::clone(&store),
        );

        Self {
            config,
            pipeline,
            store,
            inference: Some(inference),
        }
    }

    /// Build state from pre-built parts.
    pub fn from_parts(
        config: ApiConfig,
        pipeline: AnalysisPipeline,
        inference: Option<Arc<InferenceService>>,
    ) -> Self {
        let store = Arc::clone(pipeline.store());
        Self {
            config,
            pipeline,
            store,
            inference,
        }
    }
}
