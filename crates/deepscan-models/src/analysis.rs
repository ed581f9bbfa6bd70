//! Analysis result data models.
//!
//! [`AnalysisResult`] is the persisted, top-level record produced once per
//! uploaded video. It is immutable after creation and stored keyed by its
//! [`AnalysisId`].

use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::audio::AudioAnalysis;
use crate::prediction::FramePrediction;
use crate::segment::TimelineEntry;
use crate::verdict::Verdict;

/// Unique identifier for an analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct AnalysisId(pub String);

/// Error returned when parsing an externally supplied analysis id.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid analysis id: {0}")]
pub struct AnalysisIdError(pub String);

impl AnalysisId {
    /// Generate a new random analysis ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parse an id received from a client. Only UUIDs are accepted, which
    /// also keeps ids safe to use as storage keys.
    pub fn parse(s: &str) -> Result<Self, AnalysisIdError> {
        Uuid::parse_str(s.trim())
            .map(|uuid| Self(uuid.to_string()))
            .map_err(|_| AnalysisIdError(s.to_string()))
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AnalysisId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata of the analyzed video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoInfo {
    /// Duration in seconds
    pub duration: f64,
    /// Native frame rate
    pub fps: f64,
    /// Total number of frames in the stream (estimated from duration × fps
    /// when the container does not report it)
    pub frame_count: u64,
    /// Sampling interval used for frame extraction, in seconds
    #[serde(rename = "frame_rate_used")]
    pub sampling_interval: f64,
    pub width: u32,
    pub height: u32,
    pub codec: String,
}

/// Video-level statistics aggregated from the per-frame predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoAnalysis {
    pub overall_result: Verdict,
    /// Mean FAKE confidence (deepfake probability estimate), 4 decimal places
    pub overall_confidence: f64,
    /// FAKE frames over labeled frames
    pub fake_ratio: f64,
    pub total_frames: usize,
    pub fake_frames: usize,
    pub real_frames: usize,
    /// Frames whose classification failed
    pub error_frames: usize,
    pub mean_fake_confidence: f64,
    pub mean_real_confidence: f64,
}

/// Coarse risk bucket derived from the fake ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Bucket a fake ratio: `>= 0.7` high, `>= 0.3` medium, otherwise low.
    pub fn from_fake_ratio(ratio: f64) -> Self {
        if ratio >= 0.7 {
            Self::High
        } else if ratio >= 0.3 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// UI-facing summary of an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisSummary {
    pub overall_result: Verdict,
    pub confidence: f64,
    pub fake_ratio: f64,
    pub risk_level: RiskLevel,
    pub total_frames: usize,
    pub fake_frames: usize,
    pub real_frames: usize,
    pub error_frames: usize,
    pub total_segments: usize,
    /// Segments whose dominant verdict is FAKE
    pub suspicious_segments: usize,
    /// Total duration of FAKE segments in seconds
    pub suspicious_duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_result: Option<Verdict>,
    pub has_audio: bool,
    /// One-line description for display
    pub message: String,
}

/// Persisted analysis record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisResult {
    #[serde(rename = "videoId")]
    pub analysis_id: AnalysisId,
    pub video_name: String,
    pub user_id: String,
    pub analysis_timestamp: DateTime<Utc>,
    pub video_info: VideoInfo,
    pub summary: AnalysisSummary,
    pub timeline: Vec<TimelineEntry>,
    pub video_analysis: VideoAnalysis,
    pub audio_analysis: AudioAnalysis,
    #[serde(rename = "raw_frame_results")]
    pub frame_results: Vec<FramePrediction>,
}

/// Error body returned in place of an analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisFailure {
    pub error: String,
    pub video_name: String,
}

impl AnalysisFailure {
    pub fn new(error: impl Into<String>, video_name: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            video_name: video_name.into(),
        }
    }
}
