//! Event and result types produced by the detector, providers and sessions.

use serde::{Deserialize, Serialize};

use crate::buffering::segment::{now_ms, Metadata, VideoSegment};

// ---------------------------------------------------------------------------
// Presence events
// ---------------------------------------------------------------------------

/// Emitted by the presence detector on a state transition, never on steady state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignPresenceEvent {
    pub event_type: PresenceEventType,
    /// UTC wall-clock at emission, RFC 3339 with second resolution.
    pub timestamp: String,
    pub source: String,
    pub session_id: Option<String>,
    pub language_hint: Option<String>,
    /// Window mean that triggered the transition.
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresenceEventType {
    #[serde(rename = "sign_presence_detected")]
    Detected,
    #[serde(rename = "sign_presence_lost")]
    Lost,
}

/// Current UTC time formatted as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn utc_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

// ---------------------------------------------------------------------------
// Interpretations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpretationKind {
    #[default]
    Utterance,
    Command,
    Gesture,
}

/// Result of interpreting one segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignInterpretation {
    pub language: String,
    /// Id of the segment this was derived from.
    pub segment_id: String,
    pub start_time_ms: i64,
    pub end_time_ms: i64,
    /// Always populated, in `[0.0, 1.0]`.
    pub confidence: f32,
    #[serde(rename = "type", default)]
    pub kind: InterpretationKind,
    pub text: Option<String>,
    pub intent: Option<serde_json::Value>,
    pub raw_gloss: Option<Vec<String>>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl SignInterpretation {
    /// Build an utterance interpretation that back-references `segment`.
    ///
    /// An open segment gets `end_time_ms = now`.
    pub fn from_segment(
        language: impl Into<String>,
        segment: &VideoSegment,
        text: impl Into<String>,
        confidence: f32,
        gloss: Vec<String>,
    ) -> Self {
        Self {
            language: language.into(),
            segment_id: segment.segment_id().to_string(),
            start_time_ms: segment.start_time_ms,
            end_time_ms: segment.end_time_ms.unwrap_or_else(now_ms),
            confidence: confidence.clamp(0.0, 1.0),
            kind: InterpretationKind::Utterance,
            text: Some(text.into()),
            intent: None,
            raw_gloss: Some(gloss),
            metadata: Metadata::new(),
        }
    }

    pub fn with_intent(mut self, intent: serde_json::Value) -> Self {
        self.intent = Some(intent);
        self
    }

    pub fn with_kind(mut self, kind: InterpretationKind) -> Self {
        self.kind = kind;
        self
    }
}

// ---------------------------------------------------------------------------
// Signing output (text → avatar)
// ---------------------------------------------------------------------------

/// Rig-targeted animation payload. Opaque to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvatarInstructions {
    pub version: String,
    pub rig: String,
    pub keyframes: Vec<serde_json::Value>,
}

impl Default for AvatarInstructions {
    fn default() -> Self {
        Self {
            version: "1.0".into(),
            rig: "default_humanoid".into(),
            keyframes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigningOutput {
    pub language: String,
    pub text: String,
    pub gloss: Option<Vec<String>>,
    #[serde(default)]
    pub avatar_instructions: AvatarInstructions,
}

// ---------------------------------------------------------------------------
// Session status events
// ---------------------------------------------------------------------------

/// Emitted when a `SignSession` changes state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatusEvent {
    pub status: SessionStatus,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Created but not started.
    Idle,
    /// Consuming frames.
    Running,
    /// Drained and flushed; may be restarted.
    Stopped,
}
