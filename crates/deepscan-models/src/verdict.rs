//! FAKE/REAL verdicts and model label mapping.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Authenticity verdict for a frame, segment, audio track or whole video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Fake,
    Real,
}

impl Verdict {
    /// Returns the verdict as the wire string ("FAKE" / "REAL").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fake => "FAKE",
            Self::Real => "REAL",
        }
    }

    pub fn is_fake(&self) -> bool {
        matches!(self, Self::Fake)
    }

    /// Map a classifier's raw label to a verdict.
    ///
    /// Substring match on "fake"/"real" (case-insensitive) wins. Otherwise the
    /// two-class index convention applies: `0`/`LABEL_0` is REAL and
    /// `1`/`LABEL_1` is FAKE. Unknown labels fall back to REAL.
    ///
    /// # Examples
    /// ```
    /// use deepscan_models::Verdict;
    /// assert_eq!(Verdict::from_model_label("Deepfake"), Verdict::Fake);
    /// assert_eq!(Verdict::from_model_label("Realism"), Verdict::Real);
    /// assert_eq!(Verdict::from_model_label("LABEL_1"), Verdict::Fake);
    /// ```
    pub fn from_model_label(label: &str) -> Self {
        let lower = label.to_lowercase();
        if lower.contains("fake") {
            return Self::Fake;
        }
        if lower.contains("real") {
            return Self::Real;
        }
        match label.trim() {
            "1" | "LABEL_1" => Self::Fake,
            _ => Self::Real,
        }
    }

    /// Majority vote between fake and real counts. Ties resolve to FAKE.
    pub fn majority(fake: usize, real: usize) -> Self {
        if fake >= real {
            Self::Fake
        } else {
            Self::Real
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_mapping_is_case_insensitive() {
        assert_eq!(Verdict::from_model_label("FAKE"), Verdict::Fake);
        assert_eq!(Verdict::from_model_label("fake_face"), Verdict::Fake);
        assert_eq!(Verdict::from_model_label("Real"), Verdict::Real);
        assert_eq!(Verdict::from_model_label("REAL_IMAGE"), Verdict::Real);
    }

    #[test]
    fn test_index_fallback() {
        assert_eq!(Verdict::from_model_label("0"), Verdict::Real);
        assert_eq!(Verdict::from_model_label("LABEL_0"), Verdict::Real);
        assert_eq!(Verdict::from_model_label("1"), Verdict::Fake);
        assert_eq!(Verdict::from_model_label("LABEL_1"), Verdict::Fake);
    }

    #[test]
    fn test_unknown_label_defaults_to_real() {
        assert_eq!(Verdict::from_model_label("tabby cat"), Verdict::Real);
        assert_eq!(Verdict::from_model_label("LABEL_7"), Verdict::Real);
    }

    #[test]
    fn test_majority_ties_go_to_fake() {
        assert_eq!(Verdict::majority(2, 2), Verdict::Fake);
        assert_eq!(Verdict::majority(0, 0), Verdict::Fake);
        assert_eq!(Verdict::majority(1, 3), Verdict::Real);
        assert_eq!(Verdict::majority(3, 1), Verdict::Fake);
    }

    #[test]
    fn test_serde_uppercase() {
        assert_eq!(serde_json::to_string(&Verdict::Fake).unwrap(), "\"FAKE\"");
        let parsed: Verdict = serde_json::from_str("\"REAL\"").unwrap();
        assert_eq!(parsed, Verdict::Real);
    }
}
