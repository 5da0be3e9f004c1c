//! Output records emitted by the pipeline.
//!
//! All types derive `serde::Serialize` + `serde::Deserialize` and render as
//! flat snake_case JSON documents.

pub mod events;
