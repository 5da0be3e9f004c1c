//! Segmenting interpreter.
//!
//! Buffers frames into tumbling, non-overlapping segments of `segment_size`
//! frames and hands each full segment to the configured provider. `flush`
//! emits the trailing partial segment; it is the only way a short segment is
//! produced.
//!
//! Single owner: `ingest_frames` and `flush` mutate the buffer and must not be
//! called concurrently on one instance.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::buffering::frame::SignFrame;
use crate::buffering::segment::{Metadata, VideoSegment};
use crate::error::{Result, SignaError};
use crate::ipc::events::SignInterpretation;
use crate::providers::{LanguageProvider, ProviderRegistry};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Frames per segment. Must be at least 1.
    pub segment_size: usize,
    pub language_code: String,
    /// Copied into every segment's metadata (e.g. a session-wide `text_hint`).
    pub segment_metadata: Metadata,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            segment_size: 8,
            language_code: "asl".into(),
            segment_metadata: Metadata::new(),
        }
    }
}

impl InterpreterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.segment_size == 0 {
            return Err(SignaError::InvalidConfig(
                "segment_size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

pub struct SignInterpreter {
    provider: Arc<dyn LanguageProvider>,
    config: InterpreterConfig,
    buffer: Vec<SignFrame>,
}

impl SignInterpreter {
    /// The provider decides the language: a mismatching
    /// `config.language_code` is logged and replaced by the provider's.
    ///
    /// # Errors
    /// `SignaError::InvalidConfig` if `segment_size == 0`.
    pub fn new(provider: Arc<dyn LanguageProvider>, mut config: InterpreterConfig) -> Result<Self> {
        config.validate()?;
        if provider.language_code() != config.language_code {
            warn!(
                provider = provider.language_code(),
                configured = %config.language_code,
                "interpreter provider does not match configured language"
            );
            config.language_code = provider.language_code().to_string();
        }
        let buffer = Vec::with_capacity(config.segment_size);
        Ok(Self {
            provider,
            config,
            buffer,
        })
    }

    /// Resolve the provider for `config.language_code` from `registry`.
    ///
    /// # Errors
    /// `SignaError::ProviderNotFound` if no provider serves that language.
    pub fn from_registry(registry: &ProviderRegistry, config: InterpreterConfig) -> Result<Self> {
        let provider = registry.get(&config.language_code)?;
        Self::new(provider, config)
    }

    /// Append frames; every time the buffer reaches `segment_size` a segment
    /// is cut and interpreted synchronously. Results are in segment order.
    pub fn ingest_frames<I>(&mut self, frames: I) -> Vec<SignInterpretation>
    where
        I: IntoIterator<Item = SignFrame>,
    {
        let mut interpretations = Vec::new();
        for frame in frames {
            self.buffer.push(frame);
            if self.buffer.len() >= self.config.segment_size {
                interpretations.push(self.interpret_buffered());
            }
        }
        interpretations
    }

    /// Interpret any residual frames as one final, possibly short, segment.
    /// Returns an empty vec when nothing is buffered.
    pub fn flush(&mut self) -> Vec<SignInterpretation> {
        if self.buffer.is_empty() {
            return Vec::new();
        }
        vec![self.interpret_buffered()]
    }

    /// Frames waiting for the next segment.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<dyn LanguageProvider> {
        &self.provider
    }

    fn interpret_buffered(&mut self) -> SignInterpretation {
        let frames = std::mem::replace(
            &mut self.buffer,
            Vec::with_capacity(self.config.segment_size),
        );
        let segment = VideoSegment::new(frames).with_metadata(self.config.segment_metadata.clone());
        debug!(
            segment_id = %segment.segment_id(),
            frames = segment.len(),
            language = %self.config.language_code,
            "segment cut"
        );
        self.provider.interpret_segment(segment)
    }
}

impl std::fmt::Debug for SignInterpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignInterpreter")
            .field("language", &self.provider.language_code())
            .field("config", &self.config)
            .field("buffered", &self.buffer.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    use crate::buffering::segment::TEXT_HINT_KEY;
    use crate::ipc::events::SigningOutput;
    use crate::providers::AslProvider;

    /// Records the size of every segment it sees.
    #[derive(Default)]
    struct RecordingProvider {
        sizes: Mutex<Vec<usize>>,
    }

    impl LanguageProvider for RecordingProvider {
        fn language_code(&self) -> &str {
            "rec"
        }

        fn interpret_segment(&self, segment: VideoSegment) -> SignInterpretation {
            self.sizes.lock().push(segment.len());
            let first = segment.frames.first().map(|f| f.timestamp_ms).unwrap_or(-1);
            SignInterpretation::from_segment("rec", &segment, first.to_string(), 1.0, vec![])
        }

        fn generate_output(&self, text: &str, gloss: Option<Vec<String>>) -> SigningOutput {
            SigningOutput {
                language: "rec".into(),
                text: text.into(),
                gloss,
                avatar_instructions: Default::default(),
            }
        }
    }

    fn frames(n: usize) -> Vec<SignFrame> {
        (0..n).map(|i| SignFrame::new(0.0, i as i64)).collect()
    }

    fn config(segment_size: usize) -> InterpreterConfig {
        InterpreterConfig {
            segment_size,
            ..InterpreterConfig::default()
        }
    }

    #[test]
    fn batches_frames_and_flushes_remainder() {
        let mut interpreter =
            SignInterpreter::new(Arc::new(AslProvider::new()), config(3)).expect("valid config");

        let interpretations = interpreter.ingest_frames(frames(5));
        assert_eq!(interpretations.len(), 1);
        assert_eq!(interpretations[0].language, "asl");
        assert_eq!(interpreter.buffered_len(), 2);

        let flushed = interpreter.flush();
        assert_eq!(flushed.len(), 1);
        assert_eq!(flushed[0].language, "asl");
        assert_ne!(flushed[0].segment_id, interpretations[0].segment_id);

        assert!(interpreter.flush().is_empty());
    }

    #[test]
    fn segments_are_tumbling_windows() {
        let provider = Arc::new(RecordingProvider::default());
        let mut interpreter = SignInterpreter::new(provider.clone(), config(4)).expect("valid config");

        let mut out = interpreter.ingest_frames(frames(6));
        out.extend(interpreter.ingest_frames((6..10).map(|i| SignFrame::new(0.0, i))));
        out.extend(interpreter.flush());

        assert_eq!(*provider.sizes.lock(), vec![4, 4, 2]);
        let firsts: Vec<_> = out.iter().filter_map(|i| i.text.clone()).collect();
        assert_eq!(firsts, vec!["0", "4", "8"]);
    }

    #[test]
    fn segment_metadata_reaches_provider() {
        let mut cfg = config(2);
        cfg.segment_metadata
            .insert(TEXT_HINT_KEY.into(), json!("open settings"));
        let mut interpreter =
            SignInterpreter::new(Arc::new(AslProvider::new()), cfg).expect("valid config");

        let out = interpreter.ingest_frames(frames(2));
        assert_eq!(out[0].text.as_deref(), Some("open settings"));
        assert_eq!(out[0].confidence, 0.75);
    }

    #[test]
    fn provider_language_wins_over_config() {
        let provider = Arc::new(RecordingProvider::default());
        let mut interpreter = SignInterpreter::new(provider, config(1)).expect("valid config");
        assert_eq!(interpreter.config().language_code, "rec");

        let out = interpreter.ingest_frames(frames(1));
        assert_eq!(out[0].language, "rec");
    }

    #[test]
    fn zero_segment_size_is_rejected() {
        let result = SignInterpreter::new(Arc::new(AslProvider::new()), config(0));
        assert!(matches!(result, Err(SignaError::InvalidConfig(_))));
    }

    #[test]
    fn from_registry_resolves_language() {
        let registry = ProviderRegistry::new();
        registry.register(AslProvider::new());

        let interpreter =
            SignInterpreter::from_registry(&registry, config(2)).expect("asl registered");
        assert_eq!(interpreter.provider().language_code(), "asl");

        let missing = SignInterpreter::from_registry(
            &registry,
            InterpreterConfig {
                language_code: "bsl".into(),
                ..config(2)
            },
        );
        assert!(matches!(missing, Err(SignaError::ProviderNotFound { .. })));
    }
}
