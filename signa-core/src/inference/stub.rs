//! `UnloadedClassifier` — placeholder backend used when no model is available.
//!
//! Its prediction is also the fallback every real backend returns when
//! inference fails, so callers see one well-defined degraded output.

use tracing::debug;

use crate::inference::{Classifier, Prediction};
use crate::keypoints::KeypointResult;

/// Confidence of the stub when a hint is echoed.
pub const STUB_HINT_CONFIDENCE: f32 = 0.9;
/// Confidence of the stub placeholder when there is no hint.
pub const STUB_CONFIDENCE: f32 = 0.65;

/// The degraded prediction for `language_code`.
///
/// - With a hint: `(hint, 0.9, [])`.
/// - Without (or with an empty hint): `("<lang>_stub", 0.65, ["STUB"])`.
pub fn stub_prediction(language_code: &str, hint_text: Option<&str>) -> Prediction {
    match hint_text.filter(|hint| !hint.is_empty()) {
        Some(hint) => Prediction {
            text: hint.to_string(),
            confidence: STUB_HINT_CONFIDENCE,
            gloss: Vec::new(),
        },
        None => Prediction {
            text: format!("{language_code}_stub"),
            confidence: STUB_CONFIDENCE,
            gloss: vec!["STUB".to_string()],
        },
    }
}

/// Classifier that never loaded. Reports `is_loaded() == false`, so providers
/// route around it; calling `predict` directly still yields the stub.
#[derive(Debug, Clone)]
pub struct UnloadedClassifier {
    language_code: String,
}

impl UnloadedClassifier {
    pub fn new(language_code: impl Into<String>) -> Self {
        Self {
            language_code: language_code.into(),
        }
    }
}

impl Classifier for UnloadedClassifier {
    fn is_loaded(&self) -> bool {
        false
    }

    fn predict(&mut self, _keypoints: &KeypointResult, hint_text: Option<&str>) -> Prediction {
        debug!(language = %self.language_code, "UnloadedClassifier::predict — stub output");
        stub_prediction(&self.language_code, hint_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_echoes_hint_without_gloss() {
        let p = stub_prediction("asl", Some("open settings"));
        assert_eq!(p.text, "open settings");
        assert_eq!(p.confidence, STUB_HINT_CONFIDENCE);
        assert!(p.gloss.is_empty());
    }

    #[test]
    fn stub_without_hint_uses_placeholder() {
        let p = stub_prediction("asl", None);
        assert_eq!(p.text, "asl_stub");
        assert_eq!(p.confidence, STUB_CONFIDENCE);
        assert_eq!(p.gloss, vec!["STUB".to_string()]);
    }

    #[test]
    fn empty_hint_uses_placeholder() {
        let p = stub_prediction("asl", Some(""));
        assert_eq!(p.text, "asl_stub");
        assert_eq!(p.confidence, STUB_CONFIDENCE);
        assert_eq!(p.gloss, vec!["STUB".to_string()]);
    }

    #[test]
    fn unloaded_classifier_reports_not_loaded() {
        let mut classifier = UnloadedClassifier::new("bsl");
        assert!(!classifier.is_loaded());
        let p = classifier.predict(&KeypointResult::default(), None);
        assert_eq!(p.text, "bsl_stub");
    }
}
