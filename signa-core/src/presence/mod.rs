//! Sign presence detection.
//!
//! The `PresenceDetector` trait is the extensibility point: the default
//! `SignPresenceDetector` smooths a per-frame likelihood with a sliding mean
//! and two thresholds; a learned detector can replace it without touching the
//! session pipeline.

pub mod hysteresis;

pub use hysteresis::SignPresenceDetector;

use serde::{Deserialize, Serialize};

use crate::buffering::frame::SignLikelihood;
use crate::error::{Result, SignaError};
use crate::ipc::events::SignPresenceEvent;

/// Trait for presence detectors.
///
/// Detectors are stateful and owned by a single stream; calls must be
/// serialised by the owner.
pub trait PresenceDetector: Send + 'static {
    /// Feed one frame's likelihood. Returns the transition it caused, if any.
    fn observe(&mut self, likelihood: f32) -> Option<SignPresenceEvent>;

    /// Drop buffered history and return to the inactive state.
    fn reset(&mut self);

    /// Consume frames one at a time, in order, and collect the transitions.
    fn process_frames<'a, F, I>(&mut self, frames: I) -> Vec<SignPresenceEvent>
    where
        F: SignLikelihood + 'a,
        I: IntoIterator<Item = &'a F>,
        Self: Sized,
    {
        frames
            .into_iter()
            .filter_map(|frame| self.observe(frame.sign_likelihood()))
            .collect()
    }
}

/// Configuration for [`SignPresenceDetector`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Window mean at or above which an inactive detector turns active.
    pub detect_threshold: f32,
    /// Window mean at or below which an active detector turns inactive.
    /// Must be strictly below `detect_threshold`.
    pub lose_threshold: f32,
    /// Sliding window length in frames. Must be at least 1.
    pub sustain_frames: usize,
    pub language_hint: Option<String>,
    pub source: String,
    pub session_id: Option<String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            detect_threshold: 0.6,
            lose_threshold: 0.3,
            sustain_frames: 3,
            language_hint: Some("asl".into()),
            source: "signa-presence-detector".into(),
            session_id: None,
        }
    }
}

impl DetectionConfig {
    /// Reject configurations that cannot give hysteresis.
    ///
    /// Thresholds are reported, never adjusted.
    pub fn validate(&self) -> Result<()> {
        if self.sustain_frames == 0 {
            return Err(SignaError::InvalidConfig(
                "sustain_frames must be at least 1".into(),
            ));
        }
        if !(self.lose_threshold < self.detect_threshold) {
            return Err(SignaError::InvalidConfig(format!(
                "lose_threshold ({}) must be below detect_threshold ({})",
                self.lose_threshold, self.detect_threshold
            )));
        }
        Ok(())
    }
}
