//! Audio track analysis.
//!
//! The audio signal is reported alongside the frame verdicts but never
//! decides the overall result. Failures degrade to an [`AudioAnalysis`]
//! carrying an error message instead of failing the analysis.

mod extract;
mod vad;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use deepscan_models::{round2, round4, AudioAnalysis};
use tracing::{debug, warn};

use crate::command::FfmpegRunner;
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_video;

pub use extract::{decode_f32le, extract_audio_samples};
pub use vad::{summarize_speech, SileroVad, SpeechStats};

/// Sample rate for VAD processing.
const VAD_SAMPLE_RATE: usize = 16000;

/// Default speech probability threshold.
pub const DEFAULT_SPEECH_THRESHOLD: f32 = 0.5;

const ANALYZER_NAME: &str = "silero_vad";

/// Produces an audio analysis record for a video.
///
/// Implementations fill only the fields they can measure. The record is
/// passed through to the report unchanged, and the summary and segment
/// details show an audio verdict only when `overall_result` is set.
/// [`SileroAudioAnalyzer`] measures speech activity and never sets a verdict.
#[async_trait]
pub trait AudioAnalyzer: Send + Sync {
    /// Never fails: problems are reported in [`AudioAnalysis::error`].
    async fn analyze(&self, video_path: &Path) -> AudioAnalysis;
}

/// [`AudioAnalyzer`] reporting speech activity measured by Silero VAD.
#[derive(Debug, Clone)]
pub struct SileroAudioAnalyzer {
    threshold: f32,
    runner: FfmpegRunner,
}

impl Default for SileroAudioAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_SPEECH_THRESHOLD)
    }
}

impl SileroAudioAnalyzer {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            runner: FfmpegRunner::new(),
        }
    }

    /// Give up on audio extraction after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.runner = self.runner.with_timeout(timeout);
        self
    }

    async fn try_analyze(&self, video_path: &Path) -> MediaResult<AudioAnalysis> {
        let probe = probe_video(video_path).await?;
        if !probe.has_audio {
            debug!(video = %video_path.display(), "No audio stream");
            return Ok(AudioAnalysis::no_audio().with_analyzer(ANALYZER_NAME));
        }

        let samples = extract_audio_samples(&self.runner, video_path, VAD_SAMPLE_RATE).await?;
        if samples.is_empty() {
            return Ok(AudioAnalysis::no_audio().with_analyzer(ANALYZER_NAME));
        }

        let duration = samples.len() as f64 / VAD_SAMPLE_RATE as f64;
        let threshold = self.threshold;

        // VAD inference is CPU-bound
        let stats = tokio::task::spawn_blocking(move || -> MediaResult<Option<SpeechStats>> {
            let mut vad = SileroVad::new(VAD_SAMPLE_RATE)?;
            let probs = vad.analyze_stream(&samples);
            Ok(summarize_speech(&probs, threshold))
        })
        .await
        .map_err(|e| MediaError::Vad(format!("VAD task failed: {}", e)))??;

        Ok(build_analysis(duration, stats))
    }
}

#[async_trait]
impl AudioAnalyzer for SileroAudioAnalyzer {
    async fn analyze(&self, video_path: &Path) -> AudioAnalysis {
        match self.try_analyze(video_path).await {
            Ok(analysis) => {
                debug!(
                    has_audio = analysis.has_audio,
                    speech_ratio = ?analysis.speech_ratio,
                    "Audio analysis complete"
                );
                analysis
            }
            Err(e) => {
                warn!(video = %video_path.display(), error = %e, "Audio analysis failed");
                AudioAnalysis::failed(e.to_string()).with_analyzer(ANALYZER_NAME)
            }
        }
    }
}

fn build_analysis(duration: f64, stats: Option<SpeechStats>) -> AudioAnalysis {
    let mut analysis = AudioAnalysis {
        has_audio: true,
        duration: Some(round2(duration)),
        ..Default::default()
    }
    .with_analyzer(ANALYZER_NAME);

    if let Some(stats) = stats {
        analysis.speech_ratio = Some(round4(stats.speech_ratio));
        analysis.speech_segments = Some(stats.speech_segments);
        analysis.mean_speech_probability = Some(round4(stats.mean_probability));
    }

    analysis
}
