//! Feature building and score decoding shared by model-backed classifiers.
//!
//! Kept free of any runtime dependency so the policy is testable without a
//! model file.

use crate::inference::labels::LabelTable;
use crate::inference::Prediction;
use crate::keypoints::KeypointResult;

/// Flatten a keypoint result into one model input row.
///
/// 1. Concatenated per-frame feature vectors, if there are any.
/// 2. Otherwise hand landmarks then body landmarks, as `x, y, z` triples.
/// 3. Otherwise `[0.0]`.
pub fn build_feature_vector(keypoints: &KeypointResult) -> Vec<f32> {
    let flat: Vec<f32> = if !keypoints.frame_features.is_empty() {
        keypoints.frame_features.iter().flatten().copied().collect()
    } else {
        keypoints
            .hand_landmarks
            .iter()
            .chain(keypoints.body_landmarks.iter())
            .flat_map(|lm| [lm.x, lm.y, lm.z])
            .collect()
    };

    if flat.is_empty() {
        vec![0.0]
    } else {
        flat
    }
}

/// Numerically stable softmax (max is subtracted before exponentiating).
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    if logits.is_empty() {
        return Vec::new();
    }
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index and value of the largest element. First index wins ties.
pub fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, v)| match best {
            Some((_, bv)) if bv >= v => best,
            _ => Some((i, v)),
        })
}

/// Decode a raw model output into a prediction.
///
/// `dims` is the output shape; size-1 axes are squeezed. A fully squeezed
/// output (single score) becomes the confidence directly. Anything wider is
/// treated as unnormalised class scores.
///
/// Returns `None` for an empty or non-finite output; the caller degrades to
/// the stub prediction.
pub fn map_scores(
    dims: &[i64],
    scores: &[f32],
    labels: &LabelTable,
    language_code: &str,
    hint_text: Option<&str>,
) -> Option<Prediction> {
    if scores.is_empty() || scores.iter().any(|s| !s.is_finite()) {
        return None;
    }
    let hint_text = hint_text.filter(|hint| !hint.is_empty());

    let mut prediction = Prediction {
        text: hint_text
            .map(str::to_string)
            .unwrap_or_else(|| format!("{language_code}_onnx")),
        confidence: 0.0,
        gloss: if hint_text.is_some() {
            Vec::new()
        } else {
            vec!["ONNX".to_string()]
        },
    };

    let squeezed_rank = dims.iter().filter(|&&d| d != 1).count();
    if squeezed_rank == 0 && scores.len() == 1 {
        prediction.confidence = scores[0];
        return Some(prediction);
    }

    let probs = softmax(scores);
    let (idx, confidence) = argmax(&probs)?;
    prediction.confidence = confidence;
    if let Some(entry) = labels.get(idx) {
        prediction.text = entry.text.clone();
        prediction.gloss = entry.gloss.clone();
    }
    Some(prediction)
}
