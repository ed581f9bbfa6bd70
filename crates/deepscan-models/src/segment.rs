//! Timeline segments.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::verdict::Verdict;

/// A contiguous time range carrying one dominant verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Segment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Majority verdict of the member frames (ties go to FAKE)
    #[serde(rename = "ensemble_result")]
    pub label: Verdict,
    /// Mean ensemble confidence of the member frames
    pub confidence: f64,
    /// Frames that fell inside this segment, including failed ones
    pub frame_count: usize,
    pub fake_frames: usize,
    pub real_frames: usize,
}

impl Segment {
    /// Duration of this segment in seconds.
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// Fraction of labeled member frames that are FAKE.
    pub fn fake_ratio(&self) -> f64 {
        let labeled = self.fake_frames + self.real_frames;
        if labeled == 0 {
            0.0
        } else {
            self.fake_frames as f64 / labeled as f64
        }
    }
}

/// Per-segment detail blending segment stats with the overall context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SegmentDetails {
    pub duration: f64,
    pub frame_count: usize,
    pub fake_ratio: f64,
    pub confidence: f64,
    /// Whether the segment verdict matches the whole-video verdict
    pub matches_overall: bool,
    pub overall_result: Verdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_result: Option<Verdict>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_speech_ratio: Option<f64>,
    /// Short human-readable assessment for display
    pub assessment: String,
}

/// A segment as it appears in the persisted timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimelineEntry {
    #[serde(flatten)]
    pub segment: Segment,
    pub details: SegmentDetails,
}
