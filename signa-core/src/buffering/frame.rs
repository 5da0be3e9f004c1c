//! Typed frame record passed from the capture side to the detector and interpreter.

use serde::{Deserialize, Serialize};

/// Anything that carries a per-frame signing likelihood.
///
/// The presence detector only needs this one number, so it is generic over
/// this trait rather than tied to [`SignFrame`].
pub trait SignLikelihood {
    /// Likelihood that a person is signing in this frame. Expected in
    /// `[0.0, 1.0]` but not clamped.
    fn sign_likelihood(&self) -> f32;
}

/// A single spatial keypoint (normalised image coordinates + depth).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// What a frame actually carries. Interpretation is backend-defined: raw
/// pixels for an image-based extractor, landmarks for a precomputed one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FramePayload {
    #[default]
    Empty,
    /// Packed RGB8 pixels, row-major.
    Image {
        width: u32,
        height: u32,
        data: Vec<u8>,
    },
    /// Landmarks already extracted upstream.
    Landmarks {
        #[serde(default)]
        hands: Vec<Landmark>,
        #[serde(default)]
        body: Vec<Landmark>,
    },
}

/// One video frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignFrame {
    pub sign_likelihood: f32,
    #[serde(default)]
    pub timestamp_ms: i64,
    #[serde(default)]
    pub payload: FramePayload,
}

impl SignFrame {
    pub fn new(sign_likelihood: f32, timestamp_ms: i64) -> Self {
        Self {
            sign_likelihood,
            timestamp_ms,
            payload: FramePayload::Empty,
        }
    }

    pub fn with_payload(mut self, payload: FramePayload) -> Self {
        self.payload = payload;
        self
    }
}

impl SignLikelihood for SignFrame {
    fn sign_likelihood(&self) -> f32 {
        self.sign_likelihood
    }
}

impl SignLikelihood for f32 {
    fn sign_likelihood(&self) -> f32 {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_deserializes_with_defaults() {
        let frame: SignFrame =
            serde_json::from_str(r#"{"sign_likelihood": 0.8}"#).expect("parse frame");
        assert_eq!(frame.timestamp_ms, 0);
        assert_eq!(frame.payload, FramePayload::Empty);
    }

    #[test]
    fn landmark_payload_uses_kind_tag() {
        let frame = SignFrame::new(0.5, 40).with_payload(FramePayload::Landmarks {
            hands: vec![Landmark::new(0.1, 0.2, 0.3)],
            body: vec![],
        });
        let json = serde_json::to_value(&frame).expect("serialize frame");
        assert_eq!(json["payload"]["kind"], "landmarks");
        assert_eq!(json["payload"]["hands"][0]["y"].as_f64().map(|v| v as f32), Some(0.2));
    }
}
