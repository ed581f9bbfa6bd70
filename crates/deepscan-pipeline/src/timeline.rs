//! Timeline construction.
//!
//! Frames are scanned in time order. A frame joins the open segment unless
//! the segment already spans at least the minimum duration (from its start
//! to this frame) and the frame's verdict differs from the segment's current
//! dominant verdict. Then the open segment ends at this frame's timestamp
//! and a new one starts there, so segments are contiguous. The last segment
//! ends at the last frame.
//!
//! Frames without an ensemble verdict extend the open segment in time but
//! neither vote nor contribute confidence. When no frame has a verdict the
//! timeline is empty.

use deepscan_models::{mean, round4, FramePrediction, Segment, Verdict};

/// Default minimum segment duration in seconds.
pub const DEFAULT_MIN_SEGMENT_SECS: f64 = 2.0;

#[derive(Debug)]
struct OpenSegment {
    start: f64,
    last_time: f64,
    frame_count: usize,
    fake_frames: usize,
    real_frames: usize,
    confidences: Vec<f64>,
}

impl OpenSegment {
    fn starting_at(time: f64) -> Self {
        Self {
            start: time,
            last_time: time,
            frame_count: 0,
            fake_frames: 0,
            real_frames: 0,
            confidences: Vec::new(),
        }
    }

    fn push(&mut self, prediction: &FramePrediction) {
        self.last_time = prediction.time;
        self.frame_count += 1;
        match prediction.ensemble {
            Some(Verdict::Fake) => self.fake_frames += 1,
            Some(Verdict::Real) => self.real_frames += 1,
            None => return,
        }
        if let Some(confidence) = prediction.confidence {
            self.confidences.push(confidence);
        }
    }

    fn has_votes(&self) -> bool {
        self.fake_frames + self.real_frames > 0
    }

    fn dominant(&self) -> Verdict {
        Verdict::majority(self.fake_frames, self.real_frames)
    }

    fn close(self, end: f64) -> Segment {
        Segment {
            start: self.start,
            end,
            label: self.dominant(),
            confidence: round4(mean(&self.confidences).unwrap_or(0.0)),
            frame_count: self.frame_count,
            fake_frames: self.fake_frames,
            real_frames: self.real_frames,
        }
    }
}

/// Merge time-ordered frame predictions into contiguous segments.
pub fn build_timeline(predictions: &[FramePrediction], min_segment_secs: f64) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut open: Option<OpenSegment> = None;

    for prediction in predictions {
        let current = open.get_or_insert_with(|| OpenSegment::starting_at(prediction.time));

        let should_close = match prediction.ensemble {
            Some(label) => {
                current.has_votes()
                    && prediction.time - current.start >= min_segment_secs
                    && label != current.dominant()
            }
            None => false,
        };

        if should_close {
            if let Some(finished) = open.take() {
                segments.push(finished.close(prediction.time));
            }
            let mut next = OpenSegment::starting_at(prediction.time);
            next.push(prediction);
            open = Some(next);
        } else {
            current.push(prediction);
        }
    }

    if let Some(last) = open {
        if last.has_votes() {
            let end = last.last_time;
            segments.push(last.close(end));
        }
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(time: f64, label: Verdict, confidence: f64) -> FramePrediction {
        FramePrediction::from_models(time, (label, confidence), (label, confidence))
    }

    fn labels(segments: &[Segment]) -> Vec<Verdict> {
        segments.iter().map(|s| s.label).collect()
    }

    #[test]
    fn test_two_segments_cover_range() {
        let predictions = vec![
            frame(0.0, Verdict::Fake, 0.9),
            frame(1.0, Verdict::Fake, 0.8),
            frame(2.0, Verdict::Real, 0.7),
            frame(3.0, Verdict::Real, 0.6),
        ];
        let segments = build_timeline(&predictions, 2.0);

        assert_eq!(segments.len(), 2);
        assert_eq!(labels(&segments), vec![Verdict::Fake, Verdict::Real]);
        assert_eq!((segments[0].start, segments[0].end), (0.0, 2.0));
        assert_eq!((segments[1].start, segments[1].end), (2.0, 3.0));
        assert_eq!(segments[0].confidence, 0.85);
        assert_eq!(segments[1].frame_count, 2);
    }

    #[test]
    fn test_segments_are_contiguous() {
        let predictions: Vec<_> = (0..12)
            .map(|i| {
                let label = if (i / 3) % 2 == 0 { Verdict::Real } else { Verdict::Fake };
                frame(i as f64, label, 0.8)
            })
            .collect();
        let segments = build_timeline(&predictions, 2.0);

        assert_eq!(segments.first().unwrap().start, 0.0);
        assert_eq!(segments.last().unwrap().end, 11.0);
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
            assert!(pair[0].duration() >= 2.0);
        }
        let counted: usize = segments.iter().map(|s| s.frame_count).sum();
        assert_eq!(counted, 12);
    }

    #[test]
    fn test_label_change_before_minimum_is_absorbed() {
        let predictions = vec![
            frame(0.0, Verdict::Real, 0.9),
            frame(1.0, Verdict::Fake, 0.9),
            frame(2.0, Verdict::Real, 0.9),
        ];
        let segments = build_timeline(&predictions, 2.0);

        // t=1 is absorbed (span < 2). At t=2 the 1-1 tie makes FAKE dominant,
        // the span reached 2 and REAL differs, so a new segment starts.
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].label, Verdict::Fake);
        assert_eq!((segments[0].start, segments[0].end), (0.0, 2.0));
        assert_eq!((segments[1].start, segments[1].end), (2.0, 2.0));
    }

    #[test]
    fn test_same_label_never_splits() {
        let predictions: Vec<_> = (0..10).map(|i| frame(i as f64 * 3.0, Verdict::Real, 0.6)).collect();
        let segments = build_timeline(&predictions, 2.0);
        assert_eq!(segments.len(), 1);
        assert_eq!((segments[0].start, segments[0].end), (0.0, 27.0));
    }

    #[test]
    fn test_error_frames_extend_but_do_not_vote() {
        let predictions = vec![
            frame(0.0, Verdict::Real, 0.5),
            FramePrediction::failed(2.0, "bad frame"),
            FramePrediction::failed(4.0, "bad frame"),
        ];
        let segments = build_timeline(&predictions, 2.0);

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].end, 4.0);
        assert_eq!(segments[0].frame_count, 3);
        assert_eq!(segments[0].real_frames, 1);
        assert_eq!(segments[0].confidence, 0.5);
    }

    #[test]
    fn test_empty_and_all_error_inputs() {
        assert!(build_timeline(&[], 2.0).is_empty());
        let failed = vec![FramePrediction::failed(0.0, "x"), FramePrediction::failed(2.0, "x")];
        assert!(build_timeline(&failed, 2.0).is_empty());
    }

    #[test]
    fn test_single_frame() {
        let segments = build_timeline(&[frame(0.0, Verdict::Fake, 0.9)], 2.0);
        assert_eq!(segments.len(), 1);
        assert_eq!((segments[0].start, segments[0].end), (0.0, 0.0));
    }
}
