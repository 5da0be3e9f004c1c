//! Sliding-mean presence detector with hysteresis.
//!
//! ## Algorithm
//!
//! 1. Append the frame's likelihood to a window of the last `sustain_frames`
//!    values, evicting the oldest when full.
//! 2. Compute the window mean.
//! 3. Inactive and mean ≥ `detect_threshold` → turn active, emit `Detected`.
//! 4. Active and mean ≤ `lose_threshold` → turn inactive, emit `Lost`.
//! 5. Otherwise emit nothing. The band between the two thresholds keeps the
//!    state from flapping around a single boundary.

use tracing::debug;

use super::{DetectionConfig, PresenceDetector};
use crate::buffering::LikelihoodWindow;
use crate::error::Result;
use crate::ipc::events::{utc_timestamp, PresenceEventType, SignPresenceEvent};

#[derive(Debug)]
pub struct SignPresenceDetector {
    config: DetectionConfig,
    window: LikelihoodWindow,
    active: bool,
}

impl SignPresenceDetector {
    /// Create a detector after validating `config`.
    ///
    /// # Errors
    /// `SignaError::InvalidConfig` if `sustain_frames == 0` or the thresholds
    /// do not leave a hysteresis band.
    pub fn new(config: DetectionConfig) -> Result<Self> {
        config.validate()?;
        let window = LikelihoodWindow::new(config.sustain_frames);
        Ok(Self {
            config,
            window,
            active: false,
        })
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    fn emit(&self, event_type: PresenceEventType, confidence: f32) -> SignPresenceEvent {
        SignPresenceEvent {
            event_type,
            timestamp: utc_timestamp(),
            source: self.config.source.clone(),
            session_id: self.config.session_id.clone(),
            language_hint: self.config.language_hint.clone(),
            confidence,
        }
    }
}

impl PresenceDetector for SignPresenceDetector {
    fn observe(&mut self, likelihood: f32) -> Option<SignPresenceEvent> {
        self.window.push(likelihood);
        let mean = self.window.mean();

        if !self.active && mean >= self.config.detect_threshold {
            self.active = true;
            debug!(mean, "sign presence detected");
            Some(self.emit(PresenceEventType::Detected, mean))
        } else if self.active && mean <= self.config.lose_threshold {
            self.active = false;
            debug!(mean, "sign presence lost");
            Some(self.emit(PresenceEventType::Lost, mean))
        } else {
            None
        }
    }

    fn reset(&mut self) {
        self.window.clear();
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffering::frame::SignFrame;
    use approx::assert_abs_diff_eq;

    fn detector(detect: f32, lose: f32, sustain: usize) -> SignPresenceDetector {
        SignPresenceDetector::new(DetectionConfig {
            detect_threshold: detect,
            lose_threshold: lose,
            sustain_frames: sustain,
            ..DetectionConfig::default()
        })
        .expect("valid config")
    }

    fn frames(likelihoods: &[f32]) -> Vec<SignFrame> {
        likelihoods
            .iter()
            .enumerate()
            .map(|(i, &p)| SignFrame::new(p, i as i64 * 33))
            .collect()
    }

    #[test]
    fn detects_then_loses_over_sliding_mean() {
        let mut det = detector(0.6, 0.4, 2);
        let events = det.process_frames(&frames(&[0.2, 0.3, 0.7, 0.8, 0.3, 0.2]));

        let types: Vec<_> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(
            types,
            vec![PresenceEventType::Detected, PresenceEventType::Lost]
        );
        assert_abs_diff_eq!(events[0].confidence, 0.75, epsilon = 1e-6);
        assert_abs_diff_eq!(events[1].confidence, 0.25, epsilon = 1e-6);
        assert!(!det.is_active());
    }

    #[test]
    fn single_frame_at_threshold_detects() {
        let mut det = detector(0.6, 0.3, 1);
        let events = det.process_frames(&[0.6_f32]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, PresenceEventType::Detected);
        assert_abs_diff_eq!(events[0].confidence, 0.6, epsilon = 1e-6);
    }

    #[test]
    fn steady_state_emits_nothing() {
        let mut det = detector(0.6, 0.3, 1);
        assert_eq!(det.process_frames(&[0.9_f32, 0.95, 0.8, 0.7]).len(), 1);
        assert!(det.process_frames(&[0.9_f32, 0.5, 0.45]).is_empty());
        assert!(det.is_active());
    }

    #[test]
    fn band_between_thresholds_holds_state() {
        let mut det = detector(0.6, 0.3, 1);
        // Oscillating inside the band never fires.
        assert!(det.process_frames(&[0.5_f32, 0.4, 0.55, 0.35]).is_empty());
        assert!(!det.is_active());
    }

    #[test]
    fn events_strictly_alternate() {
        let mut det = detector(0.6, 0.4, 2);
        let signal: Vec<f32> = (0..200)
            .map(|i| ((i as f32) * 0.37).sin() * 0.5 + 0.5)
            .collect();
        let events = det.process_frames(&signal);
        assert!(!events.is_empty());
        assert_eq!(events[0].event_type, PresenceEventType::Detected);
        for pair in events.windows(2) {
            assert_ne!(pair[0].event_type, pair[1].event_type);
        }
    }

    #[test]
    fn state_persists_across_calls() {
        let mut det = detector(0.6, 0.4, 2);
        assert!(det.process_frames(&[0.7_f32]).len() == 1);
        // Window now [0.7, 0.05] → mean 0.375 → lost.
        let events = det.process_frames(&[0.05_f32]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, PresenceEventType::Lost);
    }

    #[test]
    fn events_carry_configured_labels() {
        let mut det = SignPresenceDetector::new(DetectionConfig {
            sustain_frames: 1,
            language_hint: Some("bsl".into()),
            source: "camera-0".into(),
            session_id: Some("sess-1".into()),
            ..DetectionConfig::default()
        })
        .expect("valid config");

        let events = det.process_frames(&[0.9_f32]);
        assert_eq!(events[0].source, "camera-0");
        assert_eq!(events[0].language_hint.as_deref(), Some("bsl"));
        assert_eq!(events[0].session_id.as_deref(), Some("sess-1"));
        assert!(events[0].timestamp.ends_with('Z'));
    }

    #[test]
    fn reset_clears_window_and_state() {
        let mut det = detector(0.6, 0.4, 3);
        det.process_frames(&[0.9_f32, 0.9, 0.9]);
        assert!(det.is_active());
        det.reset();
        assert!(!det.is_active());
        // Fresh window: a single 0.7 frame is the whole mean.
        let events = det.process_frames(&[0.7_f32]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, PresenceEventType::Detected);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let result = SignPresenceDetector::new(DetectionConfig {
            detect_threshold: 0.4,
            lose_threshold: 0.4,
            ..DetectionConfig::default()
        });
        assert!(result.is_err());
    }
}
