//! Shared data models for the DeepScan backend.
//!
//! This crate provides Serde-serializable types for:
//! - Per-model and ensemble frame verdicts
//! - Timeline segments and their details
//! - Audio analysis records
//! - The persisted analysis result and its summary
//! - The adaptive frame sampling policy

pub mod analysis;
pub mod audio;
pub mod prediction;
pub mod sampling;
pub mod segment;
pub mod utils;
pub mod verdict;

// Re-export common types
pub use analysis::{
    AnalysisFailure, AnalysisId, AnalysisIdError, AnalysisResult, AnalysisSummary, RiskLevel, VideoAnalysis,
    VideoInfo,
};
pub use audio::AudioAnalysis;
pub use prediction::{ensemble_label, FramePrediction, ModelVerdict};
pub use sampling::{frame_stride, frame_timestamp, sampling_interval_for_duration};
pub use segment::{Segment, SegmentDetails, TimelineEntry};
pub use utils::{mean, round2, round4};
pub use verdict::Verdict;
