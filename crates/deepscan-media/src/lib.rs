//! FFmpeg CLI wrapper for video analysis inputs.
//!
//! This crate provides:
//! - FFprobe metadata probing
//! - Type-safe FFmpeg command building
//! - Frame sampling at a fixed time interval
//! - Audio track analysis with Silero VAD

pub mod audio;
pub mod command;
pub mod error;
pub mod frames;
pub mod probe;

pub use audio::{AudioAnalyzer, SileroAudioAnalyzer};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use frames::{extract_frames, FfmpegFrameSampler, Frame, FrameSampler};
pub use probe::{probe_video, FfprobeProber, VideoProbe, VideoProber};
