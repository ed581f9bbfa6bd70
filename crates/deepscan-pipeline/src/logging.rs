//! Structured analysis logging.
//!
//! Every event of one analysis is emitted inside an `analysis` span that
//! carries the analysis id and the uploaded file name. Stage events add their
//! measurements as fields so log pipelines can filter and aggregate on them.

use std::time::Duration;

use deepscan_inference::InferenceError;
use deepscan_media::VideoProbe;
use deepscan_models::{AnalysisId, AnalysisResult, FramePrediction};
use tracing::{error, info, warn, Span};

use crate::error::PipelineError;

/// Stage logger for a single analysis.
#[derive(Debug, Clone)]
pub struct AnalysisLogger {
    span: Span,
}

impl AnalysisLogger {
    pub fn new(analysis_id: &AnalysisId, video_name: &str) -> Self {
        Self {
            span: tracing::info_span!(
                "analysis",
                analysis_id = %analysis_id,
                video_name = %video_name
            ),
        }
    }

    /// Span to instrument the whole analysis with.
    pub fn span(&self) -> Span {
        self.span.clone()
    }

    pub fn probed(&self, probe: &VideoProbe, interval_secs: f64) {
        info!(
            duration_secs = probe.duration,
            fps = probe.fps,
            frame_count = probe.frame_count,
            has_audio = probe.has_audio,
            interval_secs = interval_secs,
            "Video probed"
        );
    }

    pub fn sampled(&self, frames: usize, interval_secs: f64) {
        info!(frames = frames, interval_secs = interval_secs, "Frames sampled");
    }

    pub fn classifier_unavailable(&self, error: &InferenceError) {
        warn!(
            error = %error,
            "Classifier unavailable, every frame will carry the load error"
        );
    }

    pub fn classified(&self, predictions: &[FramePrediction], elapsed: Duration) {
        let errors = predictions.iter().filter(|p| p.is_error()).count();
        info!(
            frames = predictions.len(),
            errors = errors,
            elapsed_ms = elapsed.as_millis() as u64,
            "Frames classified"
        );
    }

    pub fn completed(&self, result: &AnalysisResult, elapsed: Duration) {
        let stats = &result.video_analysis;
        info!(
            overall_result = %stats.overall_result,
            fake_ratio = stats.fake_ratio,
            fake_frames = stats.fake_frames,
            real_frames = stats.real_frames,
            error_frames = stats.error_frames,
            segments = result.timeline.len(),
            has_audio = result.audio_analysis.has_audio,
            elapsed_ms = elapsed.as_millis() as u64,
            "Analysis completed"
        );
    }

    pub fn failed(&self, err: &PipelineError, elapsed: Duration) {
        error!(
            error = %err,
            kind = error_kind(err),
            elapsed_ms = elapsed.as_millis() as u64,
            "Analysis failed"
        );
    }
}

/// Short failure category used as a log field.
pub fn error_kind(err: &PipelineError) -> &'static str {
    if err.is_decode_error() {
        return "decode";
    }
    match err {
        PipelineError::Storage(_) => "storage",
        PipelineError::Io(_) => "io",
        _ => "media",
    }
}
