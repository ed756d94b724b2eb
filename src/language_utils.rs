use anyhow::{anyhow, Result};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// The translation backends all take ISO 639-1 (2-letter) target codes, so
/// this module validates and normalizes incoming codes to that form.
/// Validate and normalize a target language code to ISO 639-1
///
/// Accepts a 2-letter code directly, or a 3-letter ISO 639-3 code when the
/// language also has a 2-letter form.
pub fn normalize_target_language(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    if normalized_code.len() == 2 {
        if Language::from_639_1(&normalized_code).is_some() {
            return Ok(normalized_code);
        }
    } else if normalized_code.len() == 3 {
        if let Some(lang) = Language::from_639_3(&normalized_code) {
            if let Some(part1) = lang.to_639_1() {
                return Ok(part1.to_string());
            }
            return Err(anyhow!(
                "Language '{}' has no 2-letter ISO 639-1 code",
                lang.to_name()
            ));
        }
    }

    Err(anyhow!("Invalid language code: {}", code))
}

/// Get the English name for a language code, for log output
pub fn get_language_name(code: &str) -> Option<&'static str> {
    let normalized_code = code.trim().to_lowercase();
    let language = match normalized_code.len() {
        2 => Language::from_639_1(&normalized_code),
        3 => Language::from_639_3(&normalized_code),
        _ => None,
    };
    language.map(|lang| lang.to_name())
}
