/*!
 * Merge step: substitute resolved translations back into the marked document.
 *
 * Every placeholder is replaced exactly once. A unit with no resolution
 * (a task that never completed before the document timeout, for example)
 * gets the failure sentinel so no internal marker ever leaks into output.
 */

use std::collections::HashMap;

use log::warn;

use crate::extractor::{placeholder_for, TranslatableUnit, UnitKind};
use crate::resolver::ResolvedTranslation;

/// Text inserted where no translation could be produced
pub const FAILURE_SENTINEL: &str = "[TRANSLATION_ERROR]";

/// Substitute final text for every placeholder in the processed document
///
/// Merge keys by unit id, so completion order of the translation tasks has no
/// effect on the layout of the output.
pub fn merge(
    processed_html: &str,
    units: &[TranslatableUnit],
    results: &HashMap<u32, ResolvedTranslation>,
) -> String {
    let mut output = processed_html.to_string();

    for unit in units {
        let placeholder = placeholder_for(unit.id);
        let final_text = match results.get(&unit.id) {
            Some(resolved) => resolved.final_text.as_str(),
            None => {
                warn!(
                    "No result collected for unit {} (<{}>), inserting sentinel",
                    unit.id, unit.context.tag_name
                );
                FAILURE_SENTINEL
            }
        };

        let encoded = match unit.kind {
            UnitKind::Text => encode_text(final_text),
            UnitKind::Attribute => encode_attribute(final_text),
        };
        output = output.replacen(&placeholder, &encoded, 1);
    }

    output
}

/// Escape text for insertion into element content
///
/// Must match html5ever's serializer exactly, or merged output stops being
/// byte-identical to a document the serializer produced itself.
fn encode_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('\u{a0}', "&nbsp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape text for insertion into a double-quoted attribute value
///
/// html5ever leaves `<` and `>` literal inside attribute values, so they
/// stay literal here too.
fn encode_attribute(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('\u{a0}', "&nbsp;")
        .replace('"', "&quot;")
}
