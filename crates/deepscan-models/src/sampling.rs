//! Adaptive frame sampling policy.
//!
//! The interval is picked from the video duration. The steps are not
//! monotonic: very short clips are sampled every 2s, while clips between
//! 5s and 10s are sampled every second.

use crate::utils::round2;

/// Sampling interval (seconds between sampled frames) for a video duration.
///
/// | duration        | interval |
/// |-----------------|----------|
/// | `<= 5s`         | 2.0s     |
/// | `(5s, 10s]`     | 1.0s     |
/// | `(10s, 30s]`    | 2.0s     |
/// | `> 30s`         | 3.0s     |
pub fn sampling_interval_for_duration(duration_secs: f64) -> f64 {
    if duration_secs <= 5.0 {
        2.0
    } else if duration_secs <= 10.0 {
        1.0
    } else if duration_secs <= 30.0 {
        2.0
    } else {
        3.0
    }
}

/// Frame-index stride for a native frame rate and sampling interval.
///
/// Always at least 1 so decoding makes progress on degenerate inputs.
pub fn frame_stride(fps: f64, interval_secs: f64) -> u64 {
    let stride = (fps * interval_secs).round();
    if stride.is_finite() && stride >= 1.0 {
        stride as u64
    } else {
        1
    }
}

/// Elapsed time of a frame index, rounded to 2 decimal places.
pub fn frame_timestamp(index: u64, fps: f64) -> f64 {
    if fps > 0.0 {
        round2(index as f64 / fps)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_policy_boundaries() {
        assert_eq!(sampling_interval_for_duration(0.0), 2.0);
        assert_eq!(sampling_interval_for_duration(3.2), 2.0);
        assert_eq!(sampling_interval_for_duration(5.0), 2.0);
        assert_eq!(sampling_interval_for_duration(5.01), 1.0);
        assert_eq!(sampling_interval_for_duration(10.0), 1.0);
        assert_eq!(sampling_interval_for_duration(10.5), 2.0);
        assert_eq!(sampling_interval_for_duration(30.0), 2.0);
        assert_eq!(sampling_interval_for_duration(30.01), 3.0);
        assert_eq!(sampling_interval_for_duration(600.0), 3.0);
    }

    #[test]
    fn test_interval_is_not_monotonic() {
        assert!(sampling_interval_for_duration(4.0) > sampling_interval_for_duration(8.0));
    }

    #[test]
    fn test_frame_stride() {
        assert_eq!(frame_stride(30.0, 2.0), 60);
        assert_eq!(frame_stride(29.97, 1.0), 30);
        assert_eq!(frame_stride(24.0, 3.0), 72);
    }

    #[test]
    fn test_frame_stride_minimum_one() {
        assert_eq!(frame_stride(0.2, 1.0), 1);
        assert_eq!(frame_stride(0.0, 2.0), 1);
        assert_eq!(frame_stride(f64::NAN, 2.0), 1);
    }

    #[test]
    fn test_frame_timestamp() {
        assert_eq!(frame_timestamp(0, 30.0), 0.0);
        assert_eq!(frame_timestamp(60, 30.0), 2.0);
        assert_eq!(frame_timestamp(30, 29.97), 1.0);
        assert_eq!(frame_timestamp(10, 0.0), 0.0);
    }
}
