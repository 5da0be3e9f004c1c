//! ONNX Runtime backed sign classifier.
//!
//! ## Model I/O
//!
//! | Name            | Shape         | DType | Direction |
//! |-----------------|---------------|-------|-----------|
//! | first input     | `[1, N]`      | f32   | in        |
//! | first output    | `[1, C]`      | f32   | out       |
//!
//! `N` is whatever `build_feature_vector` yields for the segment; `C` is the
//! number of classes. Output scores are treated as logits.
//!
//! Loading never fails: a missing file or a session error leaves the
//! classifier unloaded and providers fall back to hint interpretation.

use std::path::{Path, PathBuf};

use ndarray::Array2;
use ort::session::builder::SessionBuilder;
use ort::session::{Session, SessionInputValue};
use ort::value::Value;
use tracing::{debug, info, warn};

use crate::error::{Result, SignaError};
use crate::inference::features::{build_feature_vector, map_scores};
use crate::inference::labels::LabelTable;
use crate::inference::stub::stub_prediction;
use crate::inference::{Classifier, Prediction};
use crate::keypoints::KeypointResult;

pub struct OnnxClassifierConfig {
    pub language_code: String,
    pub model_path: PathBuf,
    pub labels_path: Option<PathBuf>,
}

pub struct OnnxClassifier {
    language_code: String,
    session: Option<Session>,
    input_name: String,
    labels: LabelTable,
}

impl OnnxClassifier {
    /// Try to load the graph and label table. Never returns an error; check
    /// `is_loaded()` for the outcome.
    pub fn load(config: OnnxClassifierConfig) -> Self {
        let labels = LabelTable::load_or_empty(config.labels_path.as_deref());
        let (session, input_name) = match create_session(&config.model_path) {
            Ok((session, input_name)) => (Some(session), input_name),
            Err(e) => {
                warn!(
                    language = %config.language_code,
                    path = ?config.model_path,
                    "classifier model unavailable ({e}); falling back to hint interpretation"
                );
                (None, String::new())
            }
        };

        Self {
            language_code: config.language_code,
            session,
            input_name,
            labels,
        }
    }

    fn run_inference(&mut self, features: Vec<f32>, hint_text: Option<&str>) -> Result<Prediction> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| SignaError::OnnxSession("model not loaded".into()))?;

        let n = features.len();
        let input_arr = Array2::<f32>::from_shape_vec((1, n), features)
            .map_err(|e| SignaError::OnnxSession(e.to_string()))?;
        let input_val = Value::from_array(input_arr)
            .map_err(|e: ort::Error| SignaError::OnnxSession(e.to_string()))?;
        let input_values: Vec<(String, SessionInputValue<'_>)> =
            vec![(self.input_name.clone(), input_val.into())];

        let outputs = session
            .run(input_values)
            .map_err(|e| SignaError::OnnxSession(e.to_string()))?;
        // At least one output is guaranteed by `create_session`.
        let (shape, scores) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| SignaError::OnnxSession(e.to_string()))?;
        let dims: Vec<i64> = shape.iter().copied().collect();

        map_scores(&dims, scores, &self.labels, &self.language_code, hint_text).ok_or_else(|| {
            SignaError::OnnxSession(format!("unexpected output shape {dims:?}"))
        })
    }
}

impl Classifier for OnnxClassifier {
    fn is_loaded(&self) -> bool {
        self.session.is_some()
    }

    fn predict(&mut self, keypoints: &KeypointResult, hint_text: Option<&str>) -> Prediction {
        if !self.is_loaded() {
            return stub_prediction(&self.language_code, hint_text);
        }

        let features = build_feature_vector(keypoints);
        debug!(features = features.len(), "running sign classifier");
        match self.run_inference(features, hint_text) {
            Ok(prediction) => prediction,
            Err(e) => {
                warn!(language = %self.language_code, "classifier inference failed ({e}); using stub output");
                stub_prediction(&self.language_code, hint_text)
            }
        }
    }
}

fn create_session(model_path: &Path) -> Result<(Session, String)> {
    if !model_path.exists() {
        return Err(SignaError::ModelNotFound {
            path: model_path.to_path_buf(),
        });
    }

    let size_mb = std::fs::metadata(model_path)
        .map(|m| m.len() as f64 / 1_048_576.0)
        .unwrap_or(0.0);

    info!("=== Sign classifier startup report ===");
    info!("  path: {:?}", model_path);
    info!("  size: {:.2} MB", size_mb);

    let session = SessionBuilder::new()
        .map_err(|e| SignaError::OnnxSession(e.to_string()))?
        .commit_from_file(model_path)
        .map_err(|e| SignaError::OnnxSession(e.to_string()))?;

    let input_names: Vec<String> = session
        .inputs()
        .iter()
        .map(|outlet| outlet.name().to_string())
        .collect();
    let output_names: Vec<String> = session
        .outputs()
        .iter()
        .map(|outlet| outlet.name().to_string())
        .collect();

    info!("  inputs: {:?}", input_names);
    info!("  outputs: {:?}", output_names);

    let input_name = input_names
        .first()
        .cloned()
        .ok_or_else(|| SignaError::OnnxSession("classifier model has no inputs".into()))?;
    if output_names.is_empty() {
        return Err(SignaError::OnnxSession(
            "classifier model has no outputs".into(),
        ));
    }

    info!("=== Sign classifier ready ===");
    Ok((session, input_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Identity graph: `features` `[1, 4]` f32 in, `scores` `[1, 4]` f32 out.
    fn identity_model() -> PathBuf {
        PathBuf::from(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/identity4.onnx"
        ))
    }

    fn features(values: [f32; 4]) -> KeypointResult {
        KeypointResult {
            frame_features: vec![values.to_vec()],
            ..KeypointResult::default()
        }
    }

    #[test]
    fn missing_model_leaves_classifier_unloaded() {
        let mut classifier = OnnxClassifier::load(OnnxClassifierConfig {
            language_code: "asl".into(),
            model_path: PathBuf::from("/nonexistent/asl.onnx"),
            labels_path: None,
        });
        assert!(!classifier.is_loaded());

        let p = classifier.predict(&KeypointResult::default(), Some("hello"));
        assert_eq!(p.text, "hello");
    }

    #[test]
    fn corrupt_model_leaves_classifier_unloaded() {
        let file = tempfile::NamedTempFile::new().expect("create temp file");
        std::fs::write(file.path(), b"not an onnx graph").expect("write model");
        let classifier = OnnxClassifier::load(OnnxClassifierConfig {
            language_code: "asl".into(),
            model_path: file.path().to_path_buf(),
            labels_path: None,
        });
        assert!(!classifier.is_loaded());
    }

    #[test]
    fn loaded_model_maps_scores_through_label_table() {
        let mut labels = tempfile::NamedTempFile::new().expect("create temp file");
        std::io::Write::write_all(
            &mut labels,
            br#"{"labels": [{"id": 2, "text": "open settings", "gloss": ["OPEN", "SETTINGS"]}]}"#,
        )
        .expect("write labels");

        let mut classifier = OnnxClassifier::load(OnnxClassifierConfig {
            language_code: "asl".into(),
            model_path: identity_model(),
            labels_path: Some(labels.path().to_path_buf()),
        });
        assert!(classifier.is_loaded());

        let p = classifier.predict(&features([0.0, 0.0, 6.0, 0.0]), None);
        assert_eq!(p.text, "open settings");
        assert_eq!(p.gloss, vec!["OPEN".to_string(), "SETTINGS".to_string()]);
        assert!(p.confidence > 0.9 && p.confidence <= 1.0);

        let p = classifier.predict(&features([4.0, 0.0, 0.0, 0.0]), None);
        assert_eq!(p.text, "asl_onnx");
        assert_eq!(p.gloss, vec!["ONNX".to_string()]);
    }

    #[test]
    fn failed_inference_degrades_to_stub() {
        let mut classifier = OnnxClassifier::load(OnnxClassifierConfig {
            language_code: "asl".into(),
            model_path: identity_model(),
            labels_path: None,
        });
        assert!(classifier.is_loaded());

        // An empty keypoint result yields a single feature; the graph wants four.
        let p = classifier.predict(&KeypointResult::default(), None);
        assert_eq!(p.text, "asl_stub");
        assert_eq!(p.confidence, crate::inference::stub::STUB_CONFIDENCE);
        assert_eq!(p.gloss, vec!["STUB".to_string()]);

        let p = classifier.predict(&KeypointResult::default(), Some("hello"));
        assert_eq!(p.text, "hello");
        assert_eq!(p.confidence, crate::inference::stub::STUB_HINT_CONFIDENCE);
        assert!(classifier.is_loaded());
    }
}
