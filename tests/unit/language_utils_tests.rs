/*!
 * Tests for language code normalization.
 */

use pagelingo::language_utils::{get_language_name, normalize_target_language};

#[test]
fn test_normalizeTargetLanguage_twoLetterCode_shouldPassThrough() {
    assert_eq!(normalize_target_language("fr").unwrap(), "fr");
    assert_eq!(normalize_target_language("de").unwrap(), "de");
}

#[test]
fn test_normalizeTargetLanguage_shouldLowercaseAndTrim() {
    assert_eq!(normalize_target_language(" FR ").unwrap(), "fr");
    assert_eq!(normalize_target_language("Es").unwrap(), "es");
}

#[test]
fn test_normalizeTargetLanguage_threeLetterCode_shouldMapToTwoLetter() {
    assert_eq!(normalize_target_language("fra").unwrap(), "fr");
    assert_eq!(normalize_target_language("deu").unwrap(), "de");
    assert_eq!(normalize_target_language("jpn").unwrap(), "ja");
}

#[test]
fn test_normalizeTargetLanguage_invalidCode_shouldFail() {
    assert!(normalize_target_language("zz").is_err());
    assert!(normalize_target_language("french").is_err());
    assert!(normalize_target_language("").is_err());
}

#[test]
fn test_getLanguageName_shouldResolveKnownCodes() {
    assert_eq!(get_language_name("fr"), Some("French"));
    assert_eq!(get_language_name("deu"), Some("German"));
    assert_eq!(get_language_name("zz"), None);
}
