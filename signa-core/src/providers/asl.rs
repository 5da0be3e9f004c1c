//! American Sign Language reference provider.
//!
//! ## Interpretation policy
//!
//! 1. A classifier is configured and loaded → model path: extract keypoints
//!    (no-op extractor unless one is configured), then
//!    `Classifier::predict(keypoints, text_hint)`.
//! 2. Otherwise → hint shortcut: echo `metadata["text_hint"]` at 0.75
//!    confidence, or empty text at 0.2. The extractor is not touched.
//!
//! The text hint is forwarded on the model path as well; the classifier owns
//! the precedence between hint and model output.

use tracing::{debug, info};

use crate::buffering::segment::VideoSegment;
use crate::config::ProviderConfig;
use crate::inference::ClassifierHandle;
use crate::ipc::events::{AvatarInstructions, SignInterpretation, SigningOutput};
use crate::keypoints::{make_extractor, ExtractorHandle};
use crate::providers::LanguageProvider;

pub const ASL_LANGUAGE_CODE: &str = "asl";

/// Confidence of an interpretation that echoes a text hint.
pub const HINT_CONFIDENCE: f32 = 0.75;
/// Confidence of an interpretation with neither model nor hint.
pub const NO_HINT_CONFIDENCE: f32 = 0.2;

#[derive(Debug, Default)]
pub struct AslProvider {
    extractor: ExtractorHandle,
    classifier: Option<ClassifierHandle>,
}

impl AslProvider {
    /// Hint-only provider: no-op extractor, no classifier.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extractor(mut self, extractor: ExtractorHandle) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_classifier(mut self, classifier: ClassifierHandle) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Build from resolved configuration. Never fails: an unavailable model or
    /// keypoint backend degrades to hint interpretation.
    pub fn from_config(config: &ProviderConfig) -> Self {
        let mut provider = Self::new().with_extractor(make_extractor(config.keypoint_backend));
        if let Some(model_path) = &config.model_path {
            provider.classifier = Some(load_classifier(model_path, config));
        }
        info!(
            language = ASL_LANGUAGE_CODE,
            keypoints = ?config.keypoint_backend,
            model_loaded = provider.model_loaded(),
            "ASL provider ready"
        );
        provider
    }

    /// Whether interpretation currently takes the model path.
    pub fn model_loaded(&self) -> bool {
        self.classifier
            .as_ref()
            .map(ClassifierHandle::is_loaded)
            .unwrap_or(false)
    }

    fn interpret_with_model(
        &self,
        classifier: &ClassifierHandle,
        segment: &VideoSegment,
    ) -> SignInterpretation {
        let hint = segment.text_hint();
        let keypoints = self.extractor.extract(&segment.frames);
        let prediction = classifier.predict(&keypoints, hint);
        debug!(
            segment_id = %segment.segment_id(),
            confidence = prediction.confidence,
            "model interpretation"
        );
        SignInterpretation::from_segment(
            ASL_LANGUAGE_CODE,
            segment,
            prediction.text,
            prediction.confidence,
            prediction.gloss,
        )
    }

    fn interpret_with_hint(&self, segment: &VideoSegment) -> SignInterpretation {
        let (text, confidence) = match segment.text_hint() {
            Some(hint) => (hint.to_string(), HINT_CONFIDENCE),
            None => (String::new(), NO_HINT_CONFIDENCE),
        };
        debug!(segment_id = %segment.segment_id(), confidence, "hint interpretation");
        SignInterpretation::from_segment(ASL_LANGUAGE_CODE, segment, text, confidence, Vec::new())
    }
}

#[cfg(feature = "onnx")]
fn load_classifier(model_path: &std::path::Path, config: &ProviderConfig) -> ClassifierHandle {
    use crate::inference::{OnnxClassifier, OnnxClassifierConfig};

    ClassifierHandle::new(OnnxClassifier::load(OnnxClassifierConfig {
        language_code: ASL_LANGUAGE_CODE.into(),
        model_path: model_path.to_path_buf(),
        labels_path: config.labels_path.clone(),
    }))
}

#[cfg(not(feature = "onnx"))]
fn load_classifier(model_path: &std::path::Path, _config: &ProviderConfig) -> ClassifierHandle {
    use crate::inference::stub::UnloadedClassifier;

    tracing::warn!(
        path = ?model_path,
        "model path configured but built without the `onnx` feature; classifier unloaded"
    );
    ClassifierHandle::new(UnloadedClassifier::new(ASL_LANGUAGE_CODE))
}

impl LanguageProvider for AslProvider {
    fn language_code(&self) -> &str {
        ASL_LANGUAGE_CODE
    }

    fn interpret_segment(&self, segment: VideoSegment) -> SignInterpretation {
        match &self.classifier {
            Some(classifier) if classifier.is_loaded() => {
                self.interpret_with_model(classifier, &segment)
            }
            _ => self.interpret_with_hint(&segment),
        }
    }

    fn generate_output(&self, text: &str, gloss: Option<Vec<String>>) -> SigningOutput {
        SigningOutput {
            language: ASL_LANGUAGE_CODE.into(),
            text: text.to_string(),
            gloss: Some(gloss.unwrap_or_default()),
            avatar_instructions: AvatarInstructions::default(),
        }
    }
}
