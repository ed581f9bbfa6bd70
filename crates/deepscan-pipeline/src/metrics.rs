//! Analysis metrics.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const ANALYSES_TOTAL: &str = "deepscan_analyses_total";
    pub const ANALYSIS_DURATION_SECONDS: &str = "deepscan_analysis_duration_seconds";
    pub const FRAMES_CLASSIFIED_TOTAL: &str = "deepscan_frames_classified_total";
    pub const FRAME_ERRORS_TOTAL: &str = "deepscan_frame_errors_total";
}

/// Record a finished analysis. `result` is `fake`, `real` or `error`.
pub fn record_analysis(result: &str, duration_secs: f64) {
    let labels = [("result", result.to_string())];
    counter!(names::ANALYSES_TOTAL, &labels).increment(1);
    histogram!(names::ANALYSIS_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record classified frames for one batch.
pub fn record_frames(classified: usize, errors: usize) {
    counter!(names::FRAMES_CLASSIFIED_TOTAL).increment(classified as u64);
    if errors > 0 {
        counter!(names::FRAME_ERRORS_TOTAL).increment(errors as u64);
    }
}
