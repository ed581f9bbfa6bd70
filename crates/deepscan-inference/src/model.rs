//! Image classifier abstraction.

use deepscan_models::Verdict;
use image::DynamicImage;

use crate::error::{InferenceError, InferenceResult};

/// A single image classification model.
///
/// Implementations are blocking and are called from worker threads.
pub trait ImageModel: Send + Sync {
    /// Model name used in logs.
    fn name(&self) -> &str;

    /// Raw class logits for one image.
    fn logits(&self, image: &DynamicImage) -> InferenceResult<Vec<f32>>;

    /// Label for a class index (`id2label`).
    fn label(&self, class_index: usize) -> Option<&str>;
}

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Classify an image: top softmax class mapped to FAKE/REAL, with its probability.
///
/// The confidence is returned unrounded; rounding happens when the
/// prediction record is built.
pub fn classify_image(model: &dyn ImageModel, image: &DynamicImage) -> InferenceResult<(Verdict, f64)> {
    let logits = model.logits(image)?;
    if logits.is_empty() || logits.iter().any(|v| !v.is_finite()) {
        return Err(InferenceError::InvalidOutput(format!(
            "{} returned {} unusable logits",
            model.name(),
            logits.len()
        )));
    }

    let probs = softmax(&logits);
    let (index, prob) = probs
        .iter()
        .copied()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, p)| if p > best.1 { (i, p) } else { best });

    let verdict = match model.label(index) {
        Some(label) => Verdict::from_model_label(label),
        None => Verdict::from_model_label(&format!("LABEL_{}", index)),
    };

    Ok((verdict, prob as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedModel {
        logits: Vec<f32>,
        labels: Vec<&'static str>,
    }

    impl ImageModel for FixedModel {
        fn name(&self) -> &str {
            "fixed"
        }

        fn logits(&self, _image: &DynamicImage) -> InferenceResult<Vec<f32>> {
            Ok(self.logits.clone())
        }

        fn label(&self, class_index: usize) -> Option<&str> {
            self.labels.get(class_index).copied()
        }
    }

    fn blank() -> DynamicImage {
        DynamicImage::new_rgb8(4, 4)
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_softmax_large_logits() {
        let probs = softmax(&[1000.0, 1000.0]);
        assert!((probs[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_classify_maps_labels() {
        let model = FixedModel {
            logits: vec![0.0, 2.0],
            labels: vec!["Realism", "Deepfake"],
        };
        let (verdict, conf) = classify_image(&model, &blank()).unwrap();
        assert_eq!(verdict, Verdict::Fake);
        assert!((conf - 0.8808).abs() < 1e-3);
    }

    #[test]
    fn test_classify_falls_back_to_index_labels() {
        let model = FixedModel {
            logits: vec![3.0, 0.0],
            labels: vec![],
        };
        let (verdict, _) = classify_image(&model, &blank()).unwrap();
        assert_eq!(verdict, Verdict::Real);
    }

    #[test]
    fn test_classify_rejects_empty_output() {
        let model = FixedModel {
            logits: vec![],
            labels: vec![],
        };
        assert!(classify_image(&model, &blank()).is_err());
    }
}
