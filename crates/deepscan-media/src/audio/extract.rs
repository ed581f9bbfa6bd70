//! Audio track extraction to raw 32-bit float PCM.

use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Decode the audio track of `input` to mono f32 samples at `sample_rate`.
///
/// Returns an empty vector when the file has no decodable audio.
pub async fn extract_audio_samples(
    runner: &FfmpegRunner,
    input: &Path,
    sample_rate: usize,
) -> MediaResult<Vec<f32>> {
    let temp_audio = NamedTempFile::new()?;

    debug!(
        input = %input.display(),
        output = %temp_audio.path().display(),
        "Extracting audio for VAD"
    );

    let cmd = FfmpegCommand::new(input, temp_audio.path())
        .no_video()
        .mono_audio(sample_rate)
        .format("f32le");

    runner.run(&cmd).await.map_err(|e| match e {
        MediaError::FfmpegFailed {
            message, stderr, ..
        } => MediaError::AudioExtraction(stderr.unwrap_or(message)),
        other => other,
    })?;

    let bytes = tokio::fs::read(temp_audio.path()).await?;
    let samples = decode_f32le(&bytes);

    debug!(samples = samples.len(), "Audio extraction complete");
    Ok(samples)
}

/// Convert little-endian f32 bytes to samples. Trailing partial samples are dropped.
pub fn decode_f32le(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
