//! Audio analysis records.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::verdict::Verdict;

/// Result of analyzing a video's audio track.
///
/// Produced by an audio analyzer backend and merged unchanged into the
/// analysis report. Backends fill the fields they can compute; everything
/// else stays `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AudioAnalysis {
    /// Whether an audio stream with samples was found
    pub has_audio: bool,

    /// Audio duration in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    /// Fraction of the track classified as speech
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech_ratio: Option<f64>,

    /// Number of contiguous speech regions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech_segments: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_speech_probability: Option<f64>,

    /// Authenticity verdict, when the backend produces one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_result: Option<Verdict>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    /// Name of the backend that produced this record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,

    /// Failure message when audio could not be analyzed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AudioAnalysis {
    /// Record for a video without a usable audio track.
    pub fn no_audio() -> Self {
        Self {
            has_audio: false,
            ..Default::default()
        }
    }

    /// Record for an audio analysis that failed.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            has_audio: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Set the analyzer name.
    pub fn with_analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.analyzer = Some(analyzer.into());
        self
    }
}
