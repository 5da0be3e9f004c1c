//! Pipeline and provider configuration.
//!
//! Provider settings are resolved once at provider construction, either from an
//! injected `ProviderConfig` (usually part of a `PipelineConfig` JSON file) or
//! from `SIGNA_<LANG>_*` environment variables.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::interpreter::InterpreterConfig;
use crate::presence::DetectionConfig;

/// Default bound of the per-session frame queue.
pub const DEFAULT_FRAME_QUEUE_CAPACITY: usize = 256;

/// Default number of events buffered per subscriber channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Which landmark backend a provider should use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeypointBackend {
    /// No extraction; the classifier sees an empty keypoint result.
    #[default]
    None,
    /// Landmarks shipped inside the frames.
    Precomputed,
    /// MediaPipe hands + pose. No Rust backend exists, so this degrades to no-op.
    Mediapipe,
}

impl KeypointBackend {
    /// Parse a selector case-insensitively. Unknown values fall back to `None`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "noop" => KeypointBackend::None,
            "precomputed" => KeypointBackend::Precomputed,
            "mediapipe" => KeypointBackend::Mediapipe,
            other => {
                warn!(backend = other, "unknown keypoint backend; using none");
                KeypointBackend::None
            }
        }
    }
}

/// Per-language provider settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// ONNX classifier graph. `None` means hint-only interpretation.
    pub model_path: Option<PathBuf>,
    /// Optional `{"labels": [...]}` table for the classifier.
    pub labels_path: Option<PathBuf>,
    pub keypoint_backend: KeypointBackend,
}

impl ProviderConfig {
    /// Read `SIGNA_<LANG>_MODEL_PATH`, `SIGNA_<LANG>_LABELS_PATH` and
    /// `SIGNA_<LANG>_KEYPOINT_BACKEND`. Blank values count as unset.
    pub fn from_env(language_code: &str) -> Self {
        let prefix = format!("SIGNA_{}", language_code.to_ascii_uppercase());
        let model_path = env_path(&format!("{prefix}_MODEL_PATH"));
        let labels_path = env_path(&format!("{prefix}_LABELS_PATH"));
        let keypoint_backend = std::env::var(format!("{prefix}_KEYPOINT_BACKEND"))
            .map(|v| KeypointBackend::parse(&v))
            .unwrap_or_default();
        Self {
            model_path,
            labels_path,
            keypoint_backend,
        }
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Everything a session needs, loadable from one JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub detection: DetectionConfig,
    pub interpreter: InterpreterConfig,
    /// Provider settings keyed by language code.
    pub providers: HashMap<String, ProviderConfig>,
    pub frame_queue_capacity: usize,
    pub event_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            detection: DetectionConfig::default(),
            interpreter: InterpreterConfig::default(),
            providers: HashMap::new(),
            frame_queue_capacity: DEFAULT_FRAME_QUEUE_CAPACITY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&raw)?;
        info!(path = ?path, "loaded pipeline config");
        Ok(config)
    }

    /// Settings for `language_code`: the file entry if present, otherwise the
    /// environment.
    pub fn provider_config(&self, language_code: &str) -> ProviderConfig {
        self.providers
            .get(language_code)
            .cloned()
            .unwrap_or_else(|| ProviderConfig::from_env(language_code))
    }
}
