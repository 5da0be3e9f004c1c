//! `VideoSegment` — a bounded, ordered window of frames handed to a provider.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::frame::SignFrame;

/// String-keyed metadata attached to segments and interpretations.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Metadata key carrying a caller-supplied text hint for a segment.
pub const TEXT_HINT_KEY: &str = "text_hint";

/// Milliseconds since the Unix epoch, UTC.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A group of frames interpreted as one unit.
///
/// `segment_id` is assigned at creation and has no setter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSegment {
    segment_id: String,
    pub start_time_ms: i64,
    pub end_time_ms: Option<i64>,
    pub frames: Vec<SignFrame>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl VideoSegment {
    /// Open a new segment starting now.
    pub fn new(frames: Vec<SignFrame>) -> Self {
        Self {
            segment_id: Uuid::new_v4().to_string(),
            start_time_ms: now_ms(),
            end_time_ms: None,
            frames,
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn segment_id(&self) -> &str {
        &self.segment_id
    }

    /// Mark the segment closed at `end_time_ms`. An end earlier than the start
    /// is raised to the start.
    pub fn close(&mut self, end_time_ms: i64) {
        self.end_time_ms = Some(end_time_ms.max(self.start_time_ms));
    }

    /// The `text_hint` metadata entry, if it is a non-empty string.
    pub fn text_hint(&self) -> Option<&str> {
        self.metadata
            .get(TEXT_HINT_KEY)
            .and_then(serde_json::Value::as_str)
            .filter(|hint| !hint.is_empty())
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl Default for VideoSegment {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
