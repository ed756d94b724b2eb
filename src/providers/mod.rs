/*!
 * Provider implementations for the translation backends.
 *
 * This module contains client implementations for the remote services the
 * pipeline fans out to:
 * - Pool: a load-balanced set of interchangeable endpoints (LibreTranslate wire format)
 * - Keyed: a paid single-endpoint API (DeepL wire format)
 * - Arbiter: an LLM arbitration call (OpenAI chat-completions wire format)
 */

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::errors::ProviderError;
use crate::extractor::UnitContext;

/// Common trait for all translation providers
///
/// A provider is an opaque remote call that either returns translated text or
/// fails with a `ProviderError`. Providers never merge or reconcile results;
/// that is the resolver's job.
#[async_trait]
pub trait TranslationProvider: Send + Sync + Debug {
    /// Stable provider name, referenced by the resolver priority list
    fn name(&self) -> &str;

    /// Translate one unit's content to the target language
    async fn translate(&self, text: &str, target_language: &str)
        -> Result<String, ProviderError>;
}

/// Trait for the arbitration backend
///
/// Arbitration sees the original text, every available candidate translation,
/// and the unit's structural context, and returns its raw (unparsed) answer.
/// Defensive interpretation of that answer belongs to the resolver.
#[async_trait]
pub trait ArbitrationProvider: Send + Sync + Debug {
    /// Ask the backend to pick or synthesize one translation
    async fn arbitrate(
        &self,
        original: &str,
        candidates: &BTreeMap<String, String>,
        context: &UnitContext,
        target_language: &str,
    ) -> Result<String, ProviderError>;
}

pub mod arbiter;
pub mod keyed;
pub mod pool;
