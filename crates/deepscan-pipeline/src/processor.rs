//! End-to-end analysis of one uploaded video.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use deepscan_inference::FramePredictor;
use deepscan_media::{AudioAnalyzer, FrameSampler, VideoProber};
use deepscan_models::{sampling_interval_for_duration, AnalysisId, AnalysisResult, VideoInfo};
use deepscan_storage::AnalysisStore;
use tracing::Instrument;

use crate::aggregate::{build_report, ReportMeta};
use crate::batch::BatchOrchestrator;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::AnalysisLogger;
use crate::metrics;
use crate::scratch::ScratchSpace;
use crate::timeline::build_timeline;

/// One analysis request. Owns its scratch space, which is removed when the
/// request is dropped.
#[derive(Debug)]
pub struct AnalysisRequest {
    pub analysis_id: AnalysisId,
    pub user_id: String,
    /// Original file name as uploaded
    pub video_name: String,
    /// Uploaded video, inside `scratch`
    pub video_path: PathBuf,
    pub scratch: ScratchSpace,
}

/// Runs the full analysis for a request.
#[derive(Clone)]
pub struct AnalysisPipeline {
    config: PipelineConfig,
    prober: Arc<dyn VideoProber>,
    sampler: Arc<dyn FrameSampler>,
    predictor: Arc<dyn FramePredictor>,
    audio: Arc<dyn AudioAnalyzer>,
    store: Arc<dyn AnalysisStore>,
}

impl AnalysisPipeline {
    pub fn new(
        config: PipelineConfig,
        prober: Arc<dyn VideoProber>,
        sampler: Arc<dyn FrameSampler>,
        predictor: Arc<dyn FramePredictor>,
        audio: Arc<dyn AudioAnalyzer>,
        store: Arc<dyn AnalysisStore>,
    ) -> Self {
        Self {
            config,
            prober,
            sampler,
            predictor,
            audio,
            store,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn AnalysisStore> {
        &self.store
    }

    /// Create scratch space for a new analysis.
    pub async fn create_scratch(&self, analysis_id: &AnalysisId) -> PipelineResult<ScratchSpace> {
        ScratchSpace::create(&self.config.scratch_dir, analysis_id).await
    }

    /// Analyze the uploaded video and persist the result.
    pub async fn analyze(&self, request: AnalysisRequest) -> PipelineResult<AnalysisResult> {
        let logger = AnalysisLogger::new(&request.analysis_id, &request.video_name);
        let span = logger.span();

        async move {
            let started = Instant::now();
            let outcome = self.run(request, &logger).await;

            let label = match &outcome {
                Ok(result) => {
                    logger.completed(result, started.elapsed());
                    result.video_analysis.overall_result.as_str().to_lowercase()
                }
                Err(e) => {
                    logger.failed(e, started.elapsed());
                    "error".to_string()
                }
            };
            metrics::record_analysis(&label, started.elapsed().as_secs_f64());

            outcome
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        request: AnalysisRequest,
        logger: &AnalysisLogger,
    ) -> PipelineResult<AnalysisResult> {
        let AnalysisRequest {
            analysis_id,
            user_id,
            video_name,
            video_path,
            scratch,
        } = request;

        let probe = self.prober.probe(&video_path).await?;
        let interval = sampling_interval_for_duration(probe.duration);
        logger.probed(&probe, interval);

        let frames = self
            .sampler
            .sample(&video_path, &scratch.frames_dir(), interval)
            .await?;
        if frames.is_empty() {
            return Err(PipelineError::decode(
                "Video is empty or in an unsupported format (no frames decoded)",
            ));
        }
        logger.sampled(frames.len(), interval);

        if let Err(e) = self.predictor.prepare().await {
            logger.classifier_unavailable(&e);
        }

        let classify_started = Instant::now();
        let predictions = BatchOrchestrator::new(
            Arc::clone(&self.predictor),
            self.config.batch_size,
            self.config.max_workers,
        )
        .run(&frames)
        .await;
        logger.classified(&predictions, classify_started.elapsed());
        scratch.remove_frames().await;

        let audio = self.audio.analyze(&video_path).await;
        let segments = build_timeline(&predictions, self.config.min_segment_secs);

        let meta = ReportMeta {
            analysis_id: analysis_id.clone(),
            video_name,
            user_id,
            analysis_timestamp: Utc::now(),
            video_info: VideoInfo {
                duration: probe.duration,
                fps: probe.fps,
                frame_count: probe.frame_count,
                sampling_interval: interval,
                width: probe.width,
                height: probe.height,
                codec: probe.codec,
            },
        };
        let result = build_report(meta, predictions, segments, audio);

        self.store.save(&analysis_id, &result).await?;

        scratch.cleanup().await;
        Ok(result)
    }
}
