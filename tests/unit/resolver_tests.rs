/*!
 * Tests for the resolution fallback chain and verdict parsing.
 */

use std::collections::BTreeMap;
use std::sync::Arc;

use pagelingo::app_config::{ResolverConfig, TotalFailurePolicy};
use pagelingo::errors::ProviderError;
use pagelingo::extractor::{TranslatableUnit, UnitContext, UnitKind};
use pagelingo::merge::FAILURE_SENTINEL;
use pagelingo::resolver::{parse_verdict, FallbackStep, Provenance, Resolver};

use crate::common::mock_providers::MockArbiter;

fn sample_unit() -> TranslatableUnit {
    TranslatableUnit {
        id: 7,
        kind: UnitKind::Text,
        attribute_name: None,
        original_content: "Hello".to_string(),
        context: UnitContext {
            tag_name: "p".to_string(),
            attributes: BTreeMap::new(),
        },
    }
}

fn results_from(pairs: &[(&str, Result<&str, ProviderError>)]) -> BTreeMap<String, Result<String, ProviderError>> {
    pairs
        .iter()
        .map(|(name, result)| {
            (
                name.to_string(),
                match result {
                    Ok(text) => Ok(text.to_string()),
                    Err(_) => Err(ProviderError::ApiError {
                        status_code: 500,
                        message: "failed".to_string(),
                    }),
                },
            )
        })
        .collect()
}

fn failed() -> Result<&'static str, ProviderError> {
    Err(ProviderError::ApiError {
        status_code: 500,
        message: "failed".to_string(),
    })
}

#[tokio::test]
async fn test_resolve_withoutArbiter_shouldFollowPriorityOrder() {
    let resolver = Resolver::new(&ResolverConfig::default(), None);
    let unit = sample_unit();
    let results = results_from(&[("keyed", Ok("Bonjour")), ("pool", Ok("Salut"))]);

    let resolved = resolver.resolve(&unit, &results, "fr").await;
    assert_eq!(resolved.final_text, "Bonjour");
    assert_eq!(resolved.provenance, Provenance::Provider("keyed".to_string()));
}

#[tokio::test]
async fn test_resolve_firstPriorityFailed_shouldUseNextProvider() {
    let resolver = Resolver::new(&ResolverConfig::default(), None);
    let unit = sample_unit();
    let results = results_from(&[("keyed", failed()), ("pool", Ok("Salut"))]);

    let resolved = resolver.resolve(&unit, &results, "fr").await;
    assert_eq!(resolved.final_text, "Salut");
    assert_eq!(resolved.provenance, Provenance::Provider("pool".to_string()));
}

#[tokio::test]
async fn test_resolve_allProvidersFailed_sentinelPolicy_shouldInsertSentinel() {
    let resolver = Resolver::new(&ResolverConfig::default(), None);
    let unit = sample_unit();
    let results = results_from(&[("keyed", failed()), ("pool", failed())]);

    let resolved = resolver.resolve(&unit, &results, "fr").await;
    assert_eq!(resolved.final_text, FAILURE_SENTINEL);
    assert_eq!(resolved.provenance, Provenance::Failed);
}

#[tokio::test]
async fn test_resolve_allProvidersFailed_originalPolicy_shouldKeepOriginal() {
    let config = ResolverConfig {
        total_failure_policy: TotalFailurePolicy::Original,
        ..ResolverConfig::default()
    };
    let resolver = Resolver::new(&config, None);
    let unit = sample_unit();
    let results = results_from(&[("keyed", failed()), ("pool", failed())]);

    let resolved = resolver.resolve(&unit, &results, "fr").await;
    assert_eq!(resolved.final_text, "Hello");
    assert_eq!(resolved.provenance, Provenance::OriginalContent);
}

#[tokio::test]
async fn test_resolve_workingArbiter_shouldWinOverPriority() {
    let arbiter = Arc::new(MockArbiter::choosing("Bonjour le monde"));
    let resolver = Resolver::new(&ResolverConfig::default(), Some(arbiter.clone()));
    let unit = sample_unit();
    let results = results_from(&[("keyed", Ok("Bonjour")), ("pool", Ok("Salut"))]);

    let resolved = resolver.resolve(&unit, &results, "fr").await;
    assert_eq!(resolved.final_text, "Bonjour le monde");
    assert_eq!(resolved.provenance, Provenance::Arbitrated);
    assert_eq!(arbiter.call_count(), 1);
}

#[tokio::test]
async fn test_resolve_failingArbiter_shouldFallBackToPriority() {
    let arbiter = Arc::new(MockArbiter::failing());
    let resolver = Resolver::new(&ResolverConfig::default(), Some(arbiter.clone()));
    let unit = sample_unit();
    let results = results_from(&[("keyed", Ok("Bonjour")), ("pool", Ok("Salut"))]);

    let resolved = resolver.resolve(&unit, &results, "fr").await;
    assert_eq!(resolved.final_text, "Bonjour");
    assert_eq!(resolved.provenance, Provenance::Provider("keyed".to_string()));
    assert_eq!(arbiter.call_count(), 1);
}

#[tokio::test]
async fn test_resolve_garbageVerdict_shouldFallBackToPriority() {
    let arbiter = Arc::new(MockArbiter::raw("I think the best translation is Bonjour"));
    let resolver = Resolver::new(&ResolverConfig::default(), Some(arbiter));
    let unit = sample_unit();
    let results = results_from(&[("keyed", Ok("Bonjour")), ("pool", Ok("Salut"))]);

    let resolved = resolver.resolve(&unit, &results, "fr").await;
    assert_eq!(resolved.provenance, Provenance::Provider("keyed".to_string()));
}

#[tokio::test]
async fn test_resolve_totalFailure_shouldNotCallArbiter() {
    let arbiter = Arc::new(MockArbiter::choosing("unused"));
    let resolver = Resolver::new(&ResolverConfig::default(), Some(arbiter.clone()));
    let unit = sample_unit();
    let results = results_from(&[("keyed", failed()), ("pool", failed())]);

    let resolved = resolver.resolve(&unit, &results, "fr").await;
    assert_eq!(resolved.provenance, Provenance::Failed);
    assert_eq!(arbiter.call_count(), 0);
}

#[tokio::test]
async fn test_resolve_customChain_originalContentTerminator() {
    let chain = vec![
        FallbackStep::Provider("absent".to_string()),
        FallbackStep::OriginalContent,
    ];
    let resolver = Resolver::with_chain(chain, None, TotalFailurePolicy::Sentinel);
    let unit = sample_unit();
    let results = results_from(&[("keyed", Ok("Bonjour"))]);

    let resolved = resolver.resolve(&unit, &results, "fr").await;
    assert_eq!(resolved.final_text, "Hello");
    assert_eq!(resolved.provenance, Provenance::OriginalContent);
}

#[test]
fn test_parseVerdict_wellFormedObject_shouldReturnCombined() {
    assert_eq!(
        parse_verdict(r#"{"combined": "Bonjour le monde"}"#),
        Some("Bonjour le monde".to_string())
    );
}

#[test]
fn test_parseVerdict_keyPrecedence_combinedBeatsChosen() {
    assert_eq!(
        parse_verdict(r#"{"chosen": "Salut", "combined": "Bonjour"}"#),
        Some("Bonjour".to_string())
    );
}

#[test]
fn test_parseVerdict_alternateKeys_shouldBeAccepted() {
    assert_eq!(
        parse_verdict(r#"{"chosen": "Salut"}"#),
        Some("Salut".to_string())
    );
    assert_eq!(
        parse_verdict(r#"{"translation": "Salut"}"#),
        Some("Salut".to_string())
    );
}

#[test]
fn test_parseVerdict_truncatedJson_shouldRecoverViaPattern() {
    assert_eq!(
        parse_verdict(r#"{"combined": "Salut"#),
        None,
        "a truncated value has no closing quote to capture"
    );
    assert_eq!(
        parse_verdict(r#"Here you go: {"combined": "Salut"} hope that helps"#),
        Some("Salut".to_string())
    );
}

#[test]
fn test_parseVerdict_patternPath_shouldUnescapeJsonString() {
    assert_eq!(
        parse_verdict(r#"prefix "combined": "Il a dit \"oui\"" suffix"#),
        Some("Il a dit \"oui\"".to_string())
    );
}

#[test]
fn test_parseVerdict_emptyOrUnknown_shouldReturnNone() {
    assert_eq!(parse_verdict(r#"{"combined": ""}"#), None);
    assert_eq!(parse_verdict(r#"{"other": "Salut"}"#), None);
    assert_eq!(parse_verdict("not json at all"), None);
    assert_eq!(parse_verdict(r#""just a string""#), None);
}
