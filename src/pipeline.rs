/*!
 * Pipeline orchestration: extract, fan out, collect, merge.
 *
 * Each document moves through the stages EXTRACTED -> DISPATCHED ->
 * COLLECTED -> MERGED as a whole; inside the dispatch stage every unit is an
 * independent task. Tasks complete in any order, results are collected into
 * an id-keyed map, and merge is therefore insensitive to completion order.
 * A single unit's total failure never aborts the rest of the document.
 */

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use crate::app_config::{Config, ExtractionConfig, PipelineConfig};
use crate::errors::{AppError, ProviderError};
use crate::extractor::{self, TranslatableUnit};
use crate::merge;
use crate::providers::arbiter::OpenAiArbiter;
use crate::providers::keyed::KeyedTranslator;
use crate::providers::pool::PoolTranslator;
use crate::providers::{ArbitrationProvider, TranslationProvider};
use crate::resolver::{ResolvedTranslation, Resolver};

/// Orchestrates the translation of one document at a time
///
/// Owns the provider set and resolver; owns the unit list and result map only
/// for the duration of a single `process` call. No state survives across
/// documents except this immutable configuration.
pub struct TranslationPipeline {
    /// Translation backends queried for every unit
    providers: Vec<Arc<dyn TranslationProvider>>,
    /// Reconciliation policy
    resolver: Arc<Resolver>,
    /// Extraction allow-lists
    extraction: ExtractionConfig,
    /// Maximum number of units in flight
    max_concurrent_units: usize,
    /// Whole-document deadline; None disables it
    document_timeout: Option<Duration>,
}

impl TranslationPipeline {
    /// Build the pipeline with real providers from configuration
    pub fn new(config: &Config) -> Self {
        let providers: Vec<Arc<dyn TranslationProvider>> = vec![
            Arc::new(PoolTranslator::new(&config.providers.pool)),
            Arc::new(KeyedTranslator::new(&config.providers.keyed)),
        ];

        let arbiter: Option<Arc<dyn ArbitrationProvider>> =
            if config.providers.arbiter.enabled && !config.providers.arbiter.api_key.is_empty() {
                Some(Arc::new(OpenAiArbiter::new(&config.providers.arbiter)))
            } else {
                None
            };

        let resolver = Arc::new(Resolver::new(&config.resolver, arbiter));

        Self::with_components(
            config.extraction.clone(),
            providers,
            resolver,
            &config.pipeline,
        )
    }

    /// Build the pipeline from pre-constructed components
    ///
    /// Used by tests to wire mock providers and resolvers.
    pub fn with_components(
        extraction: ExtractionConfig,
        providers: Vec<Arc<dyn TranslationProvider>>,
        resolver: Arc<Resolver>,
        pipeline_config: &PipelineConfig,
    ) -> Self {
        let document_timeout = match pipeline_config.document_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Self {
            providers,
            resolver,
            extraction,
            max_concurrent_units: pipeline_config.max_concurrent_units,
            document_timeout,
        }
    }

    /// Translate a whole document
    pub async fn process(&self, html: &str, target_language: &str) -> Result<String, AppError> {
        self.process_with_progress(html, target_language, |_, _| {}).await
    }

    /// Translate a whole document, reporting per-unit progress
    ///
    /// The callback receives (completed units, total units) after every unit
    /// resolution, from whichever task finished it.
    pub async fn process_with_progress(
        &self,
        html: &str,
        target_language: &str,
        progress_callback: impl Fn(usize, usize) + Clone + Send + 'static,
    ) -> Result<String, AppError> {
        let extracted = extractor::extract(html, &self.extraction)?;
        let total_units = extracted.units.len();
        info!("Document extracted: {} translatable units", total_units);

        // A document with nothing to translate passes through unchanged
        if total_units == 0 {
            return Ok(html.to_string());
        }

        let results: Arc<Mutex<HashMap<u32, ResolvedTranslation>>> =
            Arc::new(Mutex::new(HashMap::with_capacity(total_units)));

        debug!(
            "Dispatching {} unit tasks ({} concurrent)",
            total_units, self.max_concurrent_units
        );
        let fan_out = self.dispatch_units(
            &extracted.units,
            target_language,
            Arc::clone(&results),
            progress_callback,
        );

        match self.document_timeout {
            Some(deadline) => {
                if tokio::time::timeout(deadline, fan_out).await.is_err() {
                    let collected = results.lock().len();
                    warn!(
                        "Document timeout after {:?}: {}/{} units resolved, merging partial results",
                        deadline, collected, total_units
                    );
                }
            }
            None => fan_out.await,
        }

        let collected = results.lock();
        info!("Collected {}/{} unit results", collected.len(), total_units);

        let merged = merge::merge(&extracted.processed_html, &extracted.units, &collected);
        debug!("Document merged ({} bytes)", merged.len());
        Ok(merged)
    }

    /// Run one task per unit through the bounded worker pool
    async fn dispatch_units(
        &self,
        units: &[TranslatableUnit],
        target_language: &str,
        results: Arc<Mutex<HashMap<u32, ResolvedTranslation>>>,
        progress_callback: impl Fn(usize, usize) + Clone + Send + 'static,
    ) {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_units));
        let total_units = units.len();
        let completed = Arc::new(AtomicUsize::new(0));

        stream::iter(units.iter().cloned())
            .map(|unit| {
                let providers = self.providers.clone();
                let resolver = Arc::clone(&self.resolver);
                let semaphore = Arc::clone(&semaphore);
                let results = Arc::clone(&results);
                let completed = Arc::clone(&completed);
                let progress_callback = progress_callback.clone();
                let target_language = target_language.to_string();

                async move {
                    // The semaphore is never closed, so acquisition only
                    // fails when the runtime is shutting down
                    let Ok(_permit) = semaphore.acquire().await else {
                        return;
                    };

                    let resolved =
                        translate_unit(&unit, &providers, &resolver, &target_language).await;

                    // One slot per unit id, written exactly once
                    results.lock().insert(unit.id, resolved);

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress_callback(done, total_units);
                }
            })
            .buffer_unordered(self.max_concurrent_units)
            .collect::<Vec<()>>()
            .await;
    }
}

/// Translate and resolve one unit
///
/// All providers are queried concurrently; a provider's failure is recorded
/// in its own slot and never blocks the others. The resolver always produces
/// a result, so this function cannot fail.
async fn translate_unit(
    unit: &TranslatableUnit,
    providers: &[Arc<dyn TranslationProvider>],
    resolver: &Resolver,
    target_language: &str,
) -> ResolvedTranslation {
    let calls = providers.iter().map(|provider| {
        let provider = Arc::clone(provider);
        let content = unit.original_content.clone();
        let target = target_language.to_string();
        async move {
            let outcome = provider.translate(&content, &target).await;
            (provider.name().to_string(), outcome)
        }
    });

    let outcomes: BTreeMap<String, Result<String, ProviderError>> =
        join_all(calls).await.into_iter().collect();

    for (name, outcome) in &outcomes {
        match outcome {
            Ok(_) => debug!("Unit {}: provider '{}' produced a candidate", unit.id, name),
            Err(e) => debug!("Unit {}: provider '{}' failed: {}", unit.id, name, e),
        }
    }

    resolver.resolve(unit, &outcomes, target_language).await
}
