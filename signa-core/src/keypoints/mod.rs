//! Keypoint extraction abstraction.
//!
//! The `KeypointExtractor` trait decouples providers from whichever landmark
//! backend is available. `NoOpExtractor` is the default and always succeeds
//! with an empty result, so a missing backend never blocks interpretation.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::buffering::frame::{FramePayload, Landmark, SignFrame};
use crate::config::KeypointBackend;

/// Features extracted from one segment.
///
/// May be empty. When `frame_features` is non-empty it takes priority over the
/// raw landmark lists for feature building.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeypointResult {
    pub hand_landmarks: Vec<Landmark>,
    pub body_landmarks: Vec<Landmark>,
    /// One flattened `[x, y, z, x, y, z, ...]` vector per frame.
    pub frame_features: Vec<Vec<f32>>,
}

impl KeypointResult {
    pub fn is_empty(&self) -> bool {
        self.hand_landmarks.is_empty()
            && self.body_landmarks.is_empty()
            && self.frame_features.is_empty()
    }
}

/// Contract for landmark backends.
pub trait KeypointExtractor: Send + 'static {
    fn extract(&mut self, frames: &[SignFrame]) -> KeypointResult;
}

/// Extractor used when no backend is configured or available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpExtractor;

impl KeypointExtractor for NoOpExtractor {
    fn extract(&mut self, _frames: &[SignFrame]) -> KeypointResult {
        KeypointResult::default()
    }
}

/// Reads landmarks that were extracted upstream and shipped inside
/// `FramePayload::Landmarks`. Frames without landmarks contribute an empty
/// feature row so rows stay aligned with frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrecomputedExtractor;

impl KeypointExtractor for PrecomputedExtractor {
    fn extract(&mut self, frames: &[SignFrame]) -> KeypointResult {
        let mut result = KeypointResult::default();
        for frame in frames {
            match &frame.payload {
                FramePayload::Landmarks { hands, body } => {
                    result.hand_landmarks.extend_from_slice(hands);
                    result.body_landmarks.extend_from_slice(body);
                    let row = hands
                        .iter()
                        .chain(body.iter())
                        .flat_map(|lm| [lm.x, lm.y, lm.z])
                        .collect();
                    result.frame_features.push(row);
                }
                _ => result.frame_features.push(Vec::new()),
            }
        }
        debug!(
            frames = frames.len(),
            hands = result.hand_landmarks.len(),
            body = result.body_landmarks.len(),
            "precomputed keypoints extracted"
        );
        result
    }
}

/// Thread-safe handle to any `KeypointExtractor`.
#[derive(Clone)]
pub struct ExtractorHandle(pub Arc<Mutex<dyn KeypointExtractor>>);

impl ExtractorHandle {
    pub fn new<E: KeypointExtractor>(extractor: E) -> Self {
        Self(Arc::new(Mutex::new(extractor)))
    }

    pub fn extract(&self, frames: &[SignFrame]) -> KeypointResult {
        self.0.lock().extract(frames)
    }
}

impl Default for ExtractorHandle {
    fn default() -> Self {
        Self::new(NoOpExtractor)
    }
}

impl std::fmt::Debug for ExtractorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorHandle").finish_non_exhaustive()
    }
}

/// Build the extractor for `backend`, degrading to `NoOpExtractor` when the
/// backend cannot be provided.
pub fn make_extractor(backend: KeypointBackend) -> ExtractorHandle {
    match backend {
        KeypointBackend::Precomputed => ExtractorHandle::new(PrecomputedExtractor),
        KeypointBackend::Mediapipe => {
            warn!("mediapipe keypoint backend is not available in this build; using no-op extractor");
            ExtractorHandle::new(NoOpExtractor)
        }
        KeypointBackend::None => ExtractorHandle::new(NoOpExtractor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn landmark_frame(hands: Vec<Landmark>, body: Vec<Landmark>) -> SignFrame {
        SignFrame::new(0.8, 0).with_payload(FramePayload::Landmarks { hands, body })
    }

    #[test]
    fn noop_returns_empty_result() {
        let mut extractor = NoOpExtractor;
        let result = extractor.extract(&[SignFrame::new(0.9, 0)]);
        assert!(result.is_empty());
    }

    #[test]
    fn precomputed_flattens_hand_then_body_per_frame() {
        let mut extractor = PrecomputedExtractor;
        let frames = vec![
            landmark_frame(
                vec![Landmark::new(0.1, 0.2, 0.3)],
                vec![Landmark::new(0.7, 0.8, 0.9)],
            ),
            SignFrame::new(0.1, 33),
        ];

        let result = extractor.extract(&frames);
        assert_eq!(result.hand_landmarks, vec![Landmark::new(0.1, 0.2, 0.3)]);
        assert_eq!(result.body_landmarks, vec![Landmark::new(0.7, 0.8, 0.9)]);
        assert_eq!(result.frame_features.len(), 2);
        assert_eq!(result.frame_features[0], vec![0.1, 0.2, 0.3, 0.7, 0.8, 0.9]);
        assert!(result.frame_features[1].is_empty());
    }

    #[test]
    fn unavailable_backend_degrades_to_noop() {
        let handle = make_extractor(KeypointBackend::Mediapipe);
        let frames = vec![landmark_frame(vec![Landmark::new(0.1, 0.1, 0.1)], vec![])];
        assert!(handle.extract(&frames).is_empty());
    }

    #[test]
    fn precomputed_backend_reads_landmarks() {
        let handle = make_extractor(KeypointBackend::Precomputed);
        let frames = vec![landmark_frame(vec![Landmark::new(0.1, 0.1, 0.1)], vec![])];
        assert_eq!(handle.extract(&frames).hand_landmarks.len(), 1);
    }
}
