//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Maximum number of stderr bytes kept in error messages.
const STDERR_TAIL_BYTES: usize = 2048;

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output path or pattern (e.g. `frames/sample_%06d.jpg`)
    output: PathBuf,
    /// Output arguments (after -i)
    output_args: Vec<String>,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
        }
    }

    fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Emit only the frames the filter graph keeps, without duplicating to a constant rate.
    pub fn variable_frame_rate(self) -> Self {
        self.output_arg("-vsync").output_arg("vfr")
    }

    /// JPEG quality for image outputs (2 = best, 31 = worst).
    pub fn jpeg_quality(self, q: u8) -> Self {
        self.output_arg("-q:v").output_arg(q.clamp(2, 31).to_string())
    }

    /// Number the first image of a pattern output with `n`.
    pub fn start_number(self, n: u64) -> Self {
        self.output_arg("-start_number").output_arg(n.to_string())
    }

    /// Drop the video stream.
    pub fn no_video(self) -> Self {
        self.output_arg("-vn")
    }

    /// Resample audio to mono at the given rate.
    pub fn mono_audio(self, sample_rate: usize) -> Self {
        self.output_arg("-ar")
            .output_arg(sample_rate.to_string())
            .output_arg("-ac")
            .output_arg("1")
    }

    /// Force the output container/format.
    pub fn format(self, format: impl Into<String>) -> Self {
        self.output_arg("-f").output_arg(format)
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args: Vec<String> = ["-y", "-nostdin", "-v", "error", "-i"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands with an optional timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegRunner {
    timeout: Option<Duration>,
}

impl FfmpegRunner {
    /// Create a runner without a time limit.
    pub fn new() -> Self {
        Self { timeout: None }
    }

    /// Kill FFmpeg if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run an FFmpeg command to completion.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        check_ffmpeg()?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut command = Command::new("ffmpeg");
        command.args(&args);
        wait_for(command, self.timeout).await
    }
}

/// Spawn `command` and wait for it, reporting a non-zero exit or an
/// exceeded time limit as [`MediaError::FfmpegFailed`].
async fn wait_for(mut command: Command, timeout: Option<Duration>) -> MediaResult<()> {
    let child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let output = match timeout {
        Some(timeout) => match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                // kill_on_drop reaps the process once the future is dropped
                warn!("FFmpeg timed out after {:?}", timeout);
                return Err(MediaError::ffmpeg_failed(
                    format!("FFmpeg timed out after {} seconds", timeout.as_secs()),
                    None,
                    None,
                ));
            }
        },
        None => child.wait_with_output().await?,
    };

    if output.status.success() {
        Ok(())
    } else {
        let stderr = stderr_tail(&output.stderr);
        Err(MediaError::ffmpeg_failed(
            "FFmpeg exited with non-zero status",
            (!stderr.is_empty()).then_some(stderr),
            output.status.code(),
        ))
    }
}

/// Keep the last few KB of stderr, which is where FFmpeg reports the failure.
fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() <= STDERR_TAIL_BYTES {
        return text.to_string();
    }
    let mut start = text.len() - STDERR_TAIL_BYTES;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder_orders_arguments() {
        let cmd = FfmpegCommand::new("input.mp4", "frames/sample_%06d.jpg")
            .video_filter("select='not(mod(n\\,30))'")
            .variable_frame_rate()
            .jpeg_quality(2)
            .start_number(0);

        let args = cmd.build_args();
        let input_pos = args.iter().position(|a| a == "-i").unwrap();
        let vf_pos = args.iter().position(|a| a == "-vf").unwrap();

        assert_eq!(args[0], "-y");
        assert_eq!(args[input_pos + 1], "input.mp4");
        assert!(vf_pos > input_pos);
        assert!(args.contains(&"vfr".to_string()));
        assert_eq!(args.last().unwrap(), "frames/sample_%06d.jpg");
    }

    #[test]
    fn test_jpeg_quality_is_clamped() {
        let args = FfmpegCommand::new("a", "b").jpeg_quality(0).build_args();
        let pos = args.iter().position(|a| a == "-q:v").unwrap();
        assert_eq!(args[pos + 1], "2");
    }

    #[test]
    fn test_audio_arguments() {
        let args = FfmpegCommand::new("in.mp4", "out.raw")
            .no_video()
            .mono_audio(16000)
            .format("f32le")
            .build_args();
        assert!(args.contains(&"-vn".to_string()));
        assert!(args.contains(&"16000".to_string()));
        assert!(args.contains(&"f32le".to_string()));
    }

    #[test]
    fn test_stderr_tail_truncates() {
        let long = "x".repeat(STDERR_TAIL_BYTES + 100);
        assert_eq!(stderr_tail(long.as_bytes()).len(), STDERR_TAIL_BYTES);
        assert_eq!(stderr_tail(b"  short error \n"), "short error");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_wait_for_enforces_timeout() {
        let mut command = Command::new("sleep");
        command.arg("5");

        let started = std::time::Instant::now();
        let err = wait_for(command, Some(Duration::from_millis(100)))
            .await
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(4));
        match err {
            MediaError::FfmpegFailed { message, stderr, .. } => {
                assert!(message.contains("timed out"));
                assert!(stderr.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_wait_for_reports_exit_code() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo broken input >&2; exit 3"]);

        let err = wait_for(command, Some(Duration::from_secs(10)))
            .await
            .unwrap_err();

        match err {
            MediaError::FfmpegFailed {
                stderr, exit_code, ..
            } => {
                assert_eq!(exit_code, Some(3));
                assert_eq!(stderr.as_deref(), Some("broken input"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
