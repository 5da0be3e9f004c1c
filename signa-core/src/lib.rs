//! # signa-core
//!
//! Reusable sign-language presence detection and interpretation SDK.
//!
//! ## Architecture
//!
//! ```text
//! frames ─► SignSession queue ─► pipeline thread
//!                                    │
//!                     ┌──────────────┴──────────────┐
//!           SignPresenceDetector            SignInterpreter (tumbling segments)
//!                     │                             │
//!           SignPresenceEvent            LanguageProvider::interpret_segment
//!                                                   │
//!                                   KeypointExtractor ─► Classifier (optional)
//!                                                   │
//!                                           SignInterpretation
//! ```
//!
//! Missing ML backends never fail the pipeline: the extractor degrades to a
//! no-op, the classifier to "not loaded", and providers to hint interpretation.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod buffering;
pub mod config;
pub mod engine;
pub mod error;
pub mod inference;
pub mod interpreter;
pub mod ipc;
pub mod keypoints;
pub mod presence;
pub mod providers;

// Convenience re-exports for downstream crates
pub use buffering::frame::{FramePayload, Landmark, SignFrame, SignLikelihood};
pub use buffering::segment::{Metadata, VideoSegment, TEXT_HINT_KEY};
pub use config::{KeypointBackend, PipelineConfig, ProviderConfig};
pub use engine::{SessionConfig, SignSession};
pub use error::SignaError;
pub use inference::{Classifier, ClassifierHandle, Prediction};
pub use interpreter::{InterpreterConfig, SignInterpreter};
pub use ipc::events::{
    AvatarInstructions, InterpretationKind, PresenceEventType, SessionStatus,
    SessionStatusEvent, SignInterpretation, SignPresenceEvent, SigningOutput,
};
pub use keypoints::{ExtractorHandle, KeypointExtractor, KeypointResult};
pub use presence::{DetectionConfig, PresenceDetector, SignPresenceDetector};
pub use providers::{AslProvider, LanguageProvider, ProviderRegistry};

#[cfg(feature = "onnx")]
pub use inference::{OnnxClassifier, OnnxClassifierConfig};
