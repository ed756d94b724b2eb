/*!
 * Common test utilities for the pagelingo test suite
 */


/// Wrap a body fragment in the canonical document skeleton
///
/// html5ever serializes a parsed document into exactly this shape, so inputs
/// built with this helper survive extraction round-trips byte for byte.
pub fn canonical_document(body: &str) -> String {
    format!("<html><head></head><body>{}</body></html>", body)
}
