/*!
 * Resolution of disagreeing provider outputs into one final text per unit.
 *
 * The fallback policy is data: an ordered list of steps walked until one
 * produces text. Arbitration is consulted first when wired; after that the
 * configured provider priority applies; the original content is the explicit
 * last resort. The resolver never fails a unit — worst case it produces the
 * failure sentinel or the original content, per the configured policy.
 */

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::app_config::{ResolverConfig, TotalFailurePolicy};
use crate::errors::{ProviderError, ResolutionError};
use crate::extractor::TranslatableUnit;
use crate::merge::FAILURE_SENTINEL;
use crate::providers::ArbitrationProvider;

/// Keys accepted in a structured arbitration verdict, most preferred first
const VERDICT_KEYS: [&str; 3] = ["combined", "chosen", "translation"];

/// Best-effort extraction of a verdict value from malformed arbitration
/// output. Only a JSON-style quoted value for a known key is accepted.
static VERDICT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?:combined|chosen|translation)"\s*:\s*("(?:[^"\\]|\\.)*")"#)
        .expect("verdict pattern is valid")
});

/// One step of the fallback chain
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackStep {
    /// Delegate the decision to the arbitration provider
    Arbitration,
    /// Use the named provider's successful output
    Provider(String),
    /// Use the unit's original untranslated content
    OriginalContent,
}

/// Which path supplied a unit's final text
#[derive(Debug, Clone, PartialEq)]
pub enum Provenance {
    /// The arbitration verdict
    Arbitrated,
    /// A single provider's output, chosen by priority
    Provider(String),
    /// The original content, kept untranslated
    OriginalContent,
    /// Nothing was available; the failure sentinel was inserted
    Failed,
}

/// The final decision for one unit
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTranslation {
    /// Id of the unit this resolution belongs to
    pub unit_id: u32,
    /// The text merged back into the document
    pub final_text: String,
    /// Which resolution path supplied the text
    pub provenance: Provenance,
}

/// Reconciles per-unit provider outputs into one final text
pub struct Resolver {
    /// Ordered fallback steps
    chain: Vec<FallbackStep>,
    /// Optional arbitration backend
    arbiter: Option<Arc<dyn ArbitrationProvider>>,
    /// Policy when no provider produced any text
    total_failure_policy: TotalFailurePolicy,
}

impl Resolver {
    /// Build a resolver from configuration
    ///
    /// The chain is arbitration first, then the configured provider priority,
    /// then the original content.
    pub fn new(config: &ResolverConfig, arbiter: Option<Arc<dyn ArbitrationProvider>>) -> Self {
        let mut chain = vec![FallbackStep::Arbitration];
        for name in &config.priority {
            chain.push(FallbackStep::Provider(name.clone()));
        }
        chain.push(FallbackStep::OriginalContent);
        Self {
            chain,
            arbiter,
            total_failure_policy: config.total_failure_policy,
        }
    }

    /// Build a resolver with an explicit chain, mainly for tests
    pub fn with_chain(
        chain: Vec<FallbackStep>,
        arbiter: Option<Arc<dyn ArbitrationProvider>>,
        total_failure_policy: TotalFailurePolicy,
    ) -> Self {
        Self {
            chain,
            arbiter,
            total_failure_policy,
        }
    }

    /// Decide the final text for one unit
    ///
    /// Never fails: every path out of this function produces *some* text.
    /// With arbitration disabled the decision is fully deterministic for a
    /// given set of provider outputs.
    pub async fn resolve(
        &self,
        unit: &TranslatableUnit,
        results: &BTreeMap<String, Result<String, ProviderError>>,
        target_language: &str,
    ) -> ResolvedTranslation {
        let candidates: BTreeMap<String, String> = results
            .iter()
            .filter_map(|(name, result)| {
                result.as_ref().ok().map(|text| (name.clone(), text.clone()))
            })
            .collect();

        if candidates.is_empty() {
            warn!(
                "Unit {}: every provider failed, applying total-failure policy",
                unit.id
            );
            return self.total_failure(unit);
        }

        for step in &self.chain {
            match step {
                FallbackStep::Arbitration => {
                    if let Some(text) = self.try_arbitration(unit, &candidates, target_language).await
                    {
                        return ResolvedTranslation {
                            unit_id: unit.id,
                            final_text: text,
                            provenance: Provenance::Arbitrated,
                        };
                    }
                }
                FallbackStep::Provider(name) => {
                    if let Some(text) = candidates.get(name) {
                        return ResolvedTranslation {
                            unit_id: unit.id,
                            final_text: text.clone(),
                            provenance: Provenance::Provider(name.clone()),
                        };
                    }
                }
                FallbackStep::OriginalContent => {
                    return ResolvedTranslation {
                        unit_id: unit.id,
                        final_text: unit.original_content.clone(),
                        provenance: Provenance::OriginalContent,
                    };
                }
            }
        }

        // A chain without an OriginalContent terminator still may run dry;
        // treat that like a total failure rather than dropping the unit.
        self.total_failure(unit)
    }

    /// Run the arbitration step, degrading to None on any problem
    async fn try_arbitration(
        &self,
        unit: &TranslatableUnit,
        candidates: &BTreeMap<String, String>,
        target_language: &str,
    ) -> Option<String> {
        match self.run_arbitration(unit, candidates, target_language).await {
            Ok(text) => Some(text),
            Err(ResolutionError::ArbiterUnavailable) => None,
            Err(e) => {
                debug!("Unit {}: arbitration skipped ({}), falling back", unit.id, e);
                None
            }
        }
    }

    async fn run_arbitration(
        &self,
        unit: &TranslatableUnit,
        candidates: &BTreeMap<String, String>,
        target_language: &str,
    ) -> Result<String, ResolutionError> {
        let arbiter = self
            .arbiter
            .as_ref()
            .ok_or(ResolutionError::ArbiterUnavailable)?;

        let raw = arbiter
            .arbitrate(
                &unit.original_content,
                candidates,
                &unit.context,
                target_language,
            )
            .await?;

        parse_verdict(&raw).ok_or_else(|| {
            let mut excerpt: String = raw.chars().take(120).collect();
            if excerpt.len() < raw.len() {
                excerpt.push_str("...");
            }
            ResolutionError::MalformedVerdict(excerpt)
        })
    }

    fn total_failure(&self, unit: &TranslatableUnit) -> ResolvedTranslation {
        match self.total_failure_policy {
            TotalFailurePolicy::Sentinel => ResolvedTranslation {
                unit_id: unit.id,
                final_text: FAILURE_SENTINEL.to_string(),
                provenance: Provenance::Failed,
            },
            TotalFailurePolicy::Original => ResolvedTranslation {
                unit_id: unit.id,
                final_text: unit.original_content.clone(),
                provenance: Provenance::OriginalContent,
            },
        }
    }
}

/// Interpret a raw arbitration payload
///
/// Accepts a well-formed JSON object carrying one of the known verdict keys;
/// failing that, attempts a narrow pattern extraction from the raw text.
/// Returns None when neither yields a non-empty value, in which case the
/// caller falls back down the chain instead of raising.
pub fn parse_verdict(raw: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) {
        if let Some(object) = value.as_object() {
            for key in VERDICT_KEYS {
                if let Some(text) = object.get(key).and_then(|v| v.as_str()) {
                    if !text.trim().is_empty() {
                        return Some(text.to_string());
                    }
                }
            }
        }
        return None;
    }

    let captured = VERDICT_PATTERN.captures(raw)?.get(1)?.as_str();
    // The capture is a JSON string literal; reuse serde to unescape it
    match serde_json::from_str::<String>(captured) {
        Ok(text) if !text.trim().is_empty() => Some(text),
        _ => None,
    }
}
