//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Parent directory for per-request scratch space
    pub scratch_dir: PathBuf,
    /// Frames classified per batch; batches run one after another
    pub batch_size: usize,
    /// Concurrent classifications within a batch
    pub max_workers: usize,
    /// Minimum timeline segment duration in seconds
    pub min_segment_secs: f64,
    /// Directory for persisted analysis results
    pub results_dir: PathBuf,
    /// Limit for a single FFmpeg run (frame or audio extraction)
    pub ffmpeg_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir().join("deepscan"),
            batch_size: 3,
            max_workers: 2,
            min_segment_secs: 2.0,
            results_dir: PathBuf::from("./results"),
            ffmpeg_timeout: Duration::from_secs(600),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            scratch_dir: std::env::var("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.scratch_dir),
            batch_size: std::env::var("BATCH_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.batch_size),
            max_workers: std::env::var("MAX_WORKERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.max_workers),
            min_segment_secs: std::env::var("MIN_SEGMENT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&s: &f64| s.is_finite() && s >= 0.0)
                .unwrap_or(defaults.min_segment_secs),
            results_dir: std::env::var("RESULTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.results_dir),
            ffmpeg_timeout: std::env::var("FFMPEG_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n: &u64| n > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.ffmpeg_timeout),
        }
    }
}
