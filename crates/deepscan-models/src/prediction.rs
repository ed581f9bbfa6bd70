//! Per-frame classification records.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::utils::round4;
use crate::verdict::Verdict;

/// One model's verdict for a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelVerdict {
    pub label: Verdict,
    /// Max softmax probability, rounded to 4 decimal places
    pub confidence: f64,
}

impl ModelVerdict {
    /// Create a verdict, rounding the confidence for reporting.
    pub fn new(label: Verdict, confidence: f64) -> Self {
        Self {
            label,
            confidence: round4(confidence),
        }
    }
}

/// Combine two model labels. FAKE wins if either model says FAKE.
pub fn ensemble_label(first: Verdict, second: Verdict) -> Verdict {
    if first.is_fake() || second.is_fake() {
        Verdict::Fake
    } else {
        Verdict::Real
    }
}

/// Classification result for a single sampled frame.
///
/// Every classification field is optional so that a failed frame can still
/// be carried through the pipeline with only `time` and `error` set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FramePrediction {
    /// Capture timestamp in seconds
    pub time: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model1: Option<ModelVerdict>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model2: Option<ModelVerdict>,

    /// Ensemble verdict (OR of the two model labels)
    #[serde(rename = "ensemble_result", default, skip_serializing_if = "Option::is_none")]
    pub ensemble: Option<Verdict>,

    /// Mean of the two model confidences, rounded to 4 decimal places
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    /// Ensemble confidence, present only when the ensemble verdict is FAKE
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fake_confidence: Option<f64>,

    /// Ensemble confidence, present only when the ensemble verdict is REAL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_confidence: Option<f64>,

    /// Per-frame failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FramePrediction {
    /// Build a prediction from the raw (unrounded) outputs of both models.
    pub fn from_models(time: f64, first: (Verdict, f64), second: (Verdict, f64)) -> Self {
        let (label1, conf1) = first;
        let (label2, conf2) = second;

        let ensemble = ensemble_label(label1, label2);
        let confidence = round4((conf1 + conf2) / 2.0);

        Self {
            time,
            model1: Some(ModelVerdict::new(label1, conf1)),
            model2: Some(ModelVerdict::new(label2, conf2)),
            ensemble: Some(ensemble),
            confidence: Some(confidence),
            fake_confidence: ensemble.is_fake().then_some(confidence),
            real_confidence: (!ensemble.is_fake()).then_some(confidence),
            error: None,
        }
    }

    /// Build an error payload for a frame that could not be classified.
    pub fn failed(time: f64, error: impl Into<String>) -> Self {
        Self {
            time,
            model1: None,
            model2: None,
            ensemble: None,
            confidence: None,
            fake_confidence: None,
            real_confidence: None,
            error: Some(error.into()),
        }
    }

    /// Returns true if this frame carries an error payload.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_fake(&self) -> bool {
        self.ensemble == Some(Verdict::Fake)
    }

    pub fn is_real(&self) -> bool {
        self.ensemble == Some(Verdict::Real)
    }
}
