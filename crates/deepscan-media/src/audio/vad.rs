//! Wrapper for Silero VAD v5 using the voice_activity_detector crate.
//!
//! Silero VAD v5 supports:
//! - 8kHz: 256 samples per frame (~32ms)
//! - 16kHz: 512 samples per frame (~32ms)

use tracing::{debug, trace};
use voice_activity_detector::VoiceActivityDetector;

use crate::error::{MediaError, MediaResult};

/// Silero VAD model state for one audio stream.
pub struct SileroVad {
    vad: VoiceActivityDetector,
    sample_rate: usize,
    frame_size: usize,
}

impl SileroVad {
    /// Create a new SileroVad instance for 8000 or 16000 Hz audio.
    pub fn new(sample_rate: usize) -> MediaResult<Self> {
        let frame_size = match sample_rate {
            8000 => 256,
            16000 => 512,
            _ => {
                return Err(MediaError::Vad(format!(
                    "Sample rate must be 8000 or 16000, got {}",
                    sample_rate
                )));
            }
        };

        let vad = VoiceActivityDetector::builder()
            .sample_rate(sample_rate as i64)
            .chunk_size(frame_size)
            .build()
            .map_err(|e| MediaError::Vad(format!("Failed to create VAD: {:?}", e)))?;

        debug!(
            sample_rate = sample_rate,
            frame_size = frame_size,
            "Initialized Silero VAD v5"
        );

        Ok(Self {
            vad,
            sample_rate,
            frame_size,
        })
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Frame duration in seconds.
    pub fn frame_duration_secs(&self) -> f64 {
        self.frame_size as f64 / self.sample_rate as f64
    }

    /// Speech probability of a single frame, 0.0 to 1.0.
    pub fn analyze_frame(&mut self, samples: &[f32]) -> f32 {
        let prob = self.vad.predict(samples.iter().copied());
        trace!(speech_prob = prob, "VAD frame analyzed");
        prob
    }

    /// Speech probability of every complete frame in `samples`.
    pub fn analyze_stream(&mut self, samples: &[f32]) -> Vec<f32> {
        let frame_size = self.frame_size;
        samples
            .chunks_exact(frame_size)
            .map(|chunk| self.analyze_frame(chunk))
            .collect()
    }
}

/// Speech activity derived from per-frame VAD probabilities.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechStats {
    /// Fraction of frames at or above the threshold
    pub speech_ratio: f64,
    /// Number of contiguous runs of speech frames
    pub speech_segments: usize,
    pub mean_probability: f64,
}

/// Summarize frame probabilities. Returns `None` when there are no frames.
pub fn summarize_speech(probabilities: &[f32], threshold: f32) -> Option<SpeechStats> {
    if probabilities.is_empty() {
        return None;
    }

    let mut speech_frames = 0usize;
    let mut speech_segments = 0usize;
    let mut in_speech = false;

    for &p in probabilities {
        let is_speech = p >= threshold;
        if is_speech {
            speech_frames += 1;
            if !in_speech {
                speech_segments += 1;
            }
        }
        in_speech = is_speech;
    }

    let total = probabilities.len() as f64;
    let sum: f64 = probabilities.iter().map(|&p| p as f64).sum();

    Some(SpeechStats {
        speech_ratio: speech_frames as f64 / total,
        speech_segments,
        mean_probability: sum / total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_sample_rate() {
        assert!(SileroVad::new(44100).is_err());
    }

    #[test]
    fn test_frame_size() {
        let vad = SileroVad::new(16000).unwrap();
        assert_eq!(vad.frame_size(), 512);
        assert!((vad.frame_duration_secs() - 0.032).abs() < 1e-9);
    }

    #[test]
    fn test_silence_has_low_probability() {
        let mut vad = SileroVad::new(16000).unwrap();
        let probs = vad.analyze_stream(&vec![0.0f32; 512 * 4 + 100]);
        assert_eq!(probs.len(), 4);
        assert!(probs.iter().all(|p| *p < 0.5));
    }

    #[test]
    fn test_summarize_counts_runs() {
        let probs = [0.1, 0.9, 0.8, 0.2, 0.6, 0.1];
        let stats = summarize_speech(&probs, 0.5).unwrap();
        assert_eq!(stats.speech_segments, 2);
        assert!((stats.speech_ratio - 0.5).abs() < 1e-9);
        assert!((stats.mean_probability - 0.45).abs() < 1e-6);
    }

    #[test]
    fn test_summarize_empty() {
        assert!(summarize_speech(&[], 0.5).is_none());
    }
}
