//! Language provider abstraction and registry.
//!
//! A `LanguageProvider` turns segments of one sign language into
//! interpretations and text into signing output. Providers are looked up by
//! language code through a `ProviderRegistry`, which is an ordinary service
//! object: construct one at startup and share it by reference (or `Arc`).

pub mod asl;

pub use asl::AslProvider;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::buffering::segment::VideoSegment;
use crate::error::{Result, SignaError};
use crate::ipc::events::{SignInterpretation, SigningOutput};

/// Contract for language-specific interpreters.
pub trait LanguageProvider: Send + Sync + 'static {
    /// Stable identifier such as `"asl"` or `"bsl"`.
    fn language_code(&self) -> &str;

    /// Interpret one segment. Takes ownership of the segment for the duration
    /// of the call; the result references it by `segment_id` only.
    ///
    /// Infallible: backend problems degrade to a low-confidence result.
    fn interpret_segment(&self, segment: VideoSegment) -> SignInterpretation;

    /// Wrap text (and optional gloss) as signing output for this language.
    fn generate_output(&self, text: &str, gloss: Option<Vec<String>>) -> SigningOutput;
}

/// Language code → provider mapping shared across sessions.
///
/// `register` and `get` lock internally, so concurrent registration and lookup
/// never observe a partially updated entry.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Arc<dyn LanguageProvider>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` under its language code. The last registration for
    /// a code wins.
    pub fn register<P: LanguageProvider>(&self, provider: P) {
        self.register_shared(Arc::new(provider));
    }

    /// Register an already shared provider.
    pub fn register_shared(&self, provider: Arc<dyn LanguageProvider>) {
        let code = provider.language_code().to_string();
        let replaced = self.providers.write().insert(code.clone(), provider);
        if replaced.is_some() {
            info!(language = %code, "provider replaced");
        } else {
            debug!(language = %code, "provider registered");
        }
    }

    /// Look up the provider for `language_code`.
    ///
    /// # Errors
    /// `SignaError::ProviderNotFound` if nothing is registered under the code.
    pub fn get(&self, language_code: &str) -> Result<Arc<dyn LanguageProvider>> {
        self.providers
            .read()
            .get(language_code)
            .cloned()
            .ok_or_else(|| SignaError::ProviderNotFound {
                language: language_code.to_string(),
            })
    }

    pub fn contains(&self, language_code: &str) -> bool {
        self.providers.read().contains_key(language_code)
    }

    /// Registered language codes, sorted.
    pub fn languages(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.providers.read().keys().cloned().collect();
        codes.sort();
        codes
    }

    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("languages", &self.languages())
            .finish()
    }
}
