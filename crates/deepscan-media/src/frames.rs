//! Frame sampling.
//!
//! Decodes a video sequentially and keeps every frame whose index is a
//! multiple of `round(fps × interval)`. Each kept frame is written as a JPEG
//! into the staging directory and tagged with its true elapsed time
//! (`index / fps`). The caller owns the staging directory and its cleanup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use deepscan_models::{frame_stride, frame_timestamp};
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_video;

/// Output file prefix for sampled frames.
const SAMPLE_PREFIX: &str = "sample_";
const SAMPLE_EXTENSION: &str = "jpg";

/// A sampled still frame on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// JPEG image path inside the staging directory
    pub path: PathBuf,
    /// Elapsed time in seconds (2 decimal places)
    pub time: f64,
    /// Index of the frame in the decoded stream
    pub index: u64,
}

/// Produces a time-ordered set of frames from a video.
#[async_trait]
pub trait FrameSampler: Send + Sync {
    /// Sample frames every `interval_secs` seconds into `output_dir`.
    ///
    /// Fails with [`MediaError::Decode`] when the video cannot be opened or
    /// yields zero frames.
    async fn sample(
        &self,
        video_path: &Path,
        output_dir: &Path,
        interval_secs: f64,
    ) -> MediaResult<Vec<Frame>>;
}

/// [`FrameSampler`] that decodes with the FFmpeg CLI.
#[derive(Debug, Clone, Default)]
pub struct FfmpegFrameSampler {
    runner: FfmpegRunner,
}

impl FfmpegFrameSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give up on videos whose frame extraction takes longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.runner = self.runner.with_timeout(timeout);
        self
    }
}

#[async_trait]
impl FrameSampler for FfmpegFrameSampler {
    async fn sample(
        &self,
        video_path: &Path,
        output_dir: &Path,
        interval_secs: f64,
    ) -> MediaResult<Vec<Frame>> {
        let probe = probe_video(video_path).await?;
        if probe.fps <= 0.0 {
            return Err(MediaError::decode("Video reports no usable frame rate"));
        }
        extract_frames(&self.runner, video_path, output_dir, interval_secs, probe.fps).await
    }
}

/// Extract every `round(fps × interval)`-th frame of `video_path` into `output_dir`.
pub async fn extract_frames(
    runner: &FfmpegRunner,
    video_path: &Path,
    output_dir: &Path,
    interval_secs: f64,
    fps: f64,
) -> MediaResult<Vec<Frame>> {
    tokio::fs::create_dir_all(output_dir).await?;

    let stride = frame_stride(fps, interval_secs);
    let pattern = output_dir.join(format!("{}%06d.{}", SAMPLE_PREFIX, SAMPLE_EXTENSION));

    debug!(
        video = %video_path.display(),
        fps = fps,
        interval_secs = interval_secs,
        stride = stride,
        "Extracting frames"
    );

    let cmd = FfmpegCommand::new(video_path, &pattern)
        .video_filter(format!("select='not(mod(n\\,{}))'", stride))
        .variable_frame_rate()
        .jpeg_quality(2)
        .start_number(0);

    runner.run(&cmd).await.map_err(|e| match e {
        MediaError::FfmpegFailed {
            message, stderr, ..
        } => MediaError::decode(stderr.unwrap_or(message)),
        other => other,
    })?;

    let frames = collect_frames(output_dir, stride, fps).await?;

    info!(
        video = %video_path.display(),
        frames = frames.len(),
        stride = stride,
        "Frame extraction complete"
    );

    Ok(frames)
}

/// Read back the sampled images, ordered by their position in the stream.
async fn collect_frames(dir: &Path, stride: u64, fps: f64) -> MediaResult<Vec<Frame>> {
    let mut numbered = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if let Some(n) = name.to_str().and_then(parse_sample_number) {
            numbered.push((n, entry.path()));
        }
    }

    if numbered.is_empty() {
        return Err(MediaError::decode(
            "Video is empty or in an unsupported format (no frames decoded)",
        ));
    }

    numbered.sort_by_key(|(n, _)| *n);

    Ok(numbered
        .into_iter()
        .map(|(n, path)| {
            let index = n * stride;
            Frame {
                path,
                time: frame_timestamp(index, fps),
                index,
            }
        })
        .collect())
}

/// Parse `sample_000042.jpg` into `42`.
fn parse_sample_number(file_name: &str) -> Option<u64> {
    file_name
        .strip_prefix(SAMPLE_PREFIX)?
        .strip_suffix(SAMPLE_EXTENSION)?
        .strip_suffix('.')?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_sample_number() {
        assert_eq!(parse_sample_number("sample_000000.jpg"), Some(0));
        assert_eq!(parse_sample_number("sample_000042.jpg"), Some(42));
        assert_eq!(parse_sample_number("sample_x.jpg"), None);
        assert_eq!(parse_sample_number("other_000001.jpg"), None);
        assert_eq!(parse_sample_number("sample_000001.png"), None);
    }

    #[tokio::test]
    async fn test_collect_frames_orders_and_timestamps() {
        let dir = TempDir::new().unwrap();
        for n in [2u64, 0, 1] {
            let path = dir.path().join(format!("sample_{:06}.jpg", n));
            tokio::fs::write(&path, b"jpeg").await.unwrap();
        }
        tokio::fs::write(dir.path().join("notes.txt"), b"ignored").await.unwrap();

        let frames = collect_frames(dir.path(), 60, 30.0).await.unwrap();

        assert_eq!(frames.len(), 3);
        assert_eq!(
            frames.iter().map(|f| f.index).collect::<Vec<_>>(),
            vec![0, 60, 120]
        );
        assert_eq!(
            frames.iter().map(|f| f.time).collect::<Vec<_>>(),
            vec![0.0, 2.0, 4.0]
        );
    }

    #[tokio::test]
    async fn test_collect_frames_empty_dir_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let err = collect_frames(dir.path(), 30, 30.0).await.unwrap_err();
        assert!(err.is_decode_error());
    }

    #[tokio::test]
    async fn test_sampler_missing_video() {
        let dir = TempDir::new().unwrap();
        let err = FfmpegFrameSampler::new()
            .sample(Path::new("/no/such/video.mp4"), dir.path(), 2.0)
            .await
            .unwrap_err();
        assert!(err.is_decode_error());
    }
}
