//! Sign classifier abstraction.
//!
//! The `Classifier` trait decouples providers from any specific model backend
//! (the unloaded stub, an ONNX graph, a remote service, ...).
//!
//! `predict` is infallible by contract: a backend that fails mid-inference
//! returns the stub prediction instead of an error, so an interpretation is
//! always produced. `&mut self` on `predict` reflects that sessions are
//! stateful; all calls are serialised through `ClassifierHandle`'s
//! `parking_lot::Mutex`.

pub mod features;
pub mod labels;
pub mod stub;

#[cfg(feature = "onnx")]
pub mod onnx;

#[cfg(feature = "onnx")]
pub use onnx::{OnnxClassifier, OnnxClassifierConfig};

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::keypoints::KeypointResult;

/// Text / confidence / gloss triple returned by a classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub text: String,
    pub confidence: f32,
    pub gloss: Vec<String>,
}

/// Contract for sign classification backends.
pub trait Classifier: Send + 'static {
    /// Whether a real model is available. Providers only take the model path
    /// when this is `true`.
    fn is_loaded(&self) -> bool;

    /// Classify one segment's keypoints.
    ///
    /// `hint_text` is forwarded from the segment metadata; the backend decides
    /// whether it overrides, seeds or is ignored in favour of model output.
    fn predict(&mut self, keypoints: &KeypointResult, hint_text: Option<&str>) -> Prediction;
}

/// Thread-safe reference-counted handle to any `Classifier` implementor.
#[derive(Clone)]
pub struct ClassifierHandle(pub Arc<Mutex<dyn Classifier>>);

impl ClassifierHandle {
    /// Wrap any `Classifier` in a `ClassifierHandle`.
    pub fn new<C: Classifier>(classifier: C) -> Self {
        Self(Arc::new(Mutex::new(classifier)))
    }

    pub fn is_loaded(&self) -> bool {
        self.0.lock().is_loaded()
    }

    pub fn predict(&self, keypoints: &KeypointResult, hint_text: Option<&str>) -> Prediction {
        self.0.lock().predict(keypoints, hint_text)
    }
}

impl std::fmt::Debug for ClassifierHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierHandle").finish_non_exhaustive()
    }
}
