/*!
 * Tests for configuration loading, defaults and validation.
 */

use std::io::Write;

use tempfile::NamedTempFile;

use pagelingo::app_config::{Config, LogLevel, TotalFailurePolicy};

#[test]
fn test_defaultConfig_shouldPassValidation() {
    let config = Config::default();
    assert!(config.validate().is_ok());
}

#[test]
fn test_defaultConfig_shouldCarryExpectedDefaults() {
    let config = Config::default();
    assert_eq!(config.target_language, "fr");
    assert_eq!(config.resolver.priority, vec!["keyed", "pool"]);
    assert_eq!(config.resolver.total_failure_policy, TotalFailurePolicy::Sentinel);
    assert_eq!(config.pipeline.max_concurrent_units, 8);
    assert_eq!(config.pipeline.document_timeout_secs, 900);
    assert_eq!(config.providers.keyed.max_attempts, 5);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.extraction.text_tags.contains(&"p".to_string()));
    assert!(config
        .extraction
        .translatable_attributes
        .contains(&"alt".to_string()));
    assert!(!config.providers.pool.endpoints.is_empty());
}

#[test]
fn test_fromFile_partialJson_shouldFillMissingFieldsWithDefaults() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "target_language": "de",
            "pipeline": {{ "max_concurrent_units": 2 }}
        }}"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.target_language, "de");
    assert_eq!(config.pipeline.max_concurrent_units, 2);
    // Untouched sections keep their defaults
    assert_eq!(config.pipeline.document_timeout_secs, 900);
    assert_eq!(config.providers.keyed.max_attempts, 5);
}

#[test]
fn test_fromFile_totalFailurePolicy_shouldParseLowercaseNames() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "resolver": {{ "total_failure_policy": "original" }} }}"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.resolver.total_failure_policy, TotalFailurePolicy::Original);
}

#[test]
fn test_fromFile_invalidJson_shouldFail() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();
    assert!(Config::from_file(file.path()).is_err());
}

#[test]
fn test_fromFile_missingFile_shouldFail() {
    assert!(Config::from_file("/nonexistent/conf.json").is_err());
}

#[test]
fn test_validate_emptyTargetLanguage_shouldFail() {
    let mut config = Config::default();
    config.target_language = "  ".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_emptyAllowLists_shouldFail() {
    let mut config = Config::default();
    config.extraction.text_tags.clear();
    config.extraction.translatable_attributes.clear();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_badPoolEndpointUrl_shouldFail() {
    let mut config = Config::default();
    config.providers.pool.endpoints = vec!["not a url".to_string()];
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_noPoolEndpoints_shouldFail() {
    let mut config = Config::default();
    config.providers.pool.endpoints.clear();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_zeroKeyedAttempts_shouldFail() {
    let mut config = Config::default();
    config.providers.keyed.max_attempts = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_zeroConcurrency_shouldFail() {
    let mut config = Config::default();
    config.pipeline.max_concurrent_units = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_emptyPriority_shouldFail() {
    let mut config = Config::default();
    config.resolver.priority.clear();
    assert!(config.validate().is_err());
}
