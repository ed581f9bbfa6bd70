//! Aggregation and report assembly.
//!
//! Pure functions over frame predictions, segments and the audio record.
//! Frames without an ensemble verdict are counted as `error_frames` and
//! excluded from the fake ratio on both sides of the division.

use chrono::{DateTime, Utc};
use deepscan_models::{
    mean, round2, round4, AnalysisId, AnalysisResult, AnalysisSummary, AudioAnalysis,
    FramePrediction, RiskLevel, Segment, SegmentDetails, TimelineEntry, Verdict, VideoAnalysis,
    VideoInfo,
};

/// Video-level statistics over all frame predictions.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameStats {
    pub total_frames: usize,
    pub fake_frames: usize,
    pub real_frames: usize,
    pub error_frames: usize,
    /// FAKE frames over labeled frames; 0.0 without labeled frames
    pub fake_ratio: f64,
    pub mean_fake_confidence: f64,
    pub mean_real_confidence: f64,
    pub overall: Verdict,
}

impl FrameStats {
    pub fn labeled_frames(&self) -> usize {
        self.fake_frames + self.real_frames
    }
}

/// Compute frame statistics. FAKE when at least half the labeled frames are FAKE.
pub fn frame_statistics(predictions: &[FramePrediction]) -> FrameStats {
    let fake_frames = predictions.iter().filter(|p| p.is_fake()).count();
    let real_frames = predictions.iter().filter(|p| p.is_real()).count();
    let labeled = fake_frames + real_frames;

    let fake_confidences: Vec<f64> = predictions.iter().filter_map(|p| p.fake_confidence).collect();
    let real_confidences: Vec<f64> = predictions.iter().filter_map(|p| p.real_confidence).collect();

    let fake_ratio = if labeled == 0 {
        0.0
    } else {
        fake_frames as f64 / labeled as f64
    };

    let overall = if labeled > 0 && fake_ratio >= 0.5 {
        Verdict::Fake
    } else {
        Verdict::Real
    };

    FrameStats {
        total_frames: predictions.len(),
        fake_frames,
        real_frames,
        error_frames: predictions.len() - labeled,
        fake_ratio,
        mean_fake_confidence: mean(&fake_confidences).unwrap_or(0.0),
        mean_real_confidence: mean(&real_confidences).unwrap_or(0.0),
        overall,
    }
}

/// Video-level section of the report.
pub fn video_analysis(stats: &FrameStats) -> VideoAnalysis {
    VideoAnalysis {
        overall_result: stats.overall,
        // Mean FAKE confidence doubles as the deepfake probability estimate
        overall_confidence: round4(stats.mean_fake_confidence),
        fake_ratio: round4(stats.fake_ratio),
        total_frames: stats.total_frames,
        fake_frames: stats.fake_frames,
        real_frames: stats.real_frames,
        error_frames: stats.error_frames,
        mean_fake_confidence: round4(stats.mean_fake_confidence),
        mean_real_confidence: round4(stats.mean_real_confidence),
    }
}

/// UI-facing summary.
pub fn summarize(stats: &FrameStats, segments: &[Segment], audio: &AudioAnalysis) -> AnalysisSummary {
    let suspicious: Vec<&Segment> = segments.iter().filter(|s| s.label.is_fake()).collect();
    let suspicious_duration: f64 = suspicious.iter().map(|s| s.duration()).sum();

    let confidence = match stats.overall {
        Verdict::Fake => stats.mean_fake_confidence,
        Verdict::Real => stats.mean_real_confidence,
    };

    AnalysisSummary {
        overall_result: stats.overall,
        confidence: round4(confidence),
        fake_ratio: round4(stats.fake_ratio),
        risk_level: RiskLevel::from_fake_ratio(stats.fake_ratio),
        total_frames: stats.total_frames,
        fake_frames: stats.fake_frames,
        real_frames: stats.real_frames,
        error_frames: stats.error_frames,
        total_segments: segments.len(),
        suspicious_segments: suspicious.len(),
        suspicious_duration: round2(suspicious_duration),
        audio_result: audio.overall_result,
        has_audio: audio.has_audio,
        message: summary_message(stats),
    }
}

fn summary_message(stats: &FrameStats) -> String {
    if stats.labeled_frames() == 0 {
        return "No frames could be classified".to_string();
    }
    let percent = stats.fake_ratio * 100.0;
    match stats.overall {
        Verdict::Fake => format!(
            "Deepfake indicators found in {:.1}% of analyzed frames",
            percent
        ),
        Verdict::Real => format!(
            "No significant deepfake indicators ({:.1}% of analyzed frames flagged)",
            percent
        ),
    }
}

/// Per-segment details in the context of the whole video and its audio.
pub fn segment_details(segment: &Segment, stats: &FrameStats, audio: &AudioAnalysis) -> SegmentDetails {
    let fake_ratio = segment.fake_ratio();
    let assessment = match segment.label {
        Verdict::Fake if fake_ratio >= 0.7 => "High likelihood of manipulation",
        Verdict::Fake => "Possible manipulation",
        Verdict::Real => "No manipulation detected",
    };

    SegmentDetails {
        duration: round2(segment.duration()),
        frame_count: segment.frame_count,
        fake_ratio: round4(fake_ratio),
        confidence: segment.confidence,
        matches_overall: segment.label == stats.overall,
        overall_result: stats.overall,
        audio_result: audio.overall_result,
        audio_speech_ratio: audio.speech_ratio,
        assessment: assessment.to_string(),
    }
}

/// Identity and metadata of the analyzed upload.
#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub analysis_id: AnalysisId,
    pub video_name: String,
    pub user_id: String,
    pub analysis_timestamp: DateTime<Utc>,
    pub video_info: VideoInfo,
}

/// Assemble the persisted record.
pub fn build_report(
    meta: ReportMeta,
    predictions: Vec<FramePrediction>,
    segments: Vec<Segment>,
    audio: AudioAnalysis,
) -> AnalysisResult {
    let stats = frame_statistics(&predictions);
    let summary = summarize(&stats, &segments, &audio);

    let timeline = segments
        .into_iter()
        .map(|segment| TimelineEntry {
            details: segment_details(&segment, &stats, &audio),
            segment,
        })
        .collect();

    AnalysisResult {
        analysis_id: meta.analysis_id,
        video_name: meta.video_name,
        user_id: meta.user_id,
        analysis_timestamp: meta.analysis_timestamp,
        video_info: meta.video_info,
        summary,
        timeline,
        video_analysis: video_analysis(&stats),
        audio_analysis: audio,
        frame_results: predictions,
    }
}
