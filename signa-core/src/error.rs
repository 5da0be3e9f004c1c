use thiserror::Error;

/// All errors produced by signa-core.
///
/// Backend unavailability (missing model, unreadable label file, failed
/// inference) is absorbed where the fallback lives and never reaches pipeline
/// callers through this type; it only shows up from explicit loader calls.
#[derive(Debug, Error)]
pub enum SignaError {
    #[error("no provider registered for language: {language}")]
    ProviderNotFound { language: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("model file not found: {path}")]
    ModelNotFound { path: std::path::PathBuf },

    #[error("ONNX session error: {0}")]
    OnnxSession(String),

    #[error("label file error: {0}")]
    LabelFile(String),

    #[error("session is already running")]
    AlreadyRunning,

    #[error("session is not running")]
    NotRunning,

    #[error("frame queue is full: pipeline cannot keep up")]
    FrameQueueFull,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SignaError>;
