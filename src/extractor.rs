/*!
 * Unit extraction from HTML documents.
 *
 * This module parses an HTML document, finds translatable text nodes and
 * attribute values according to the configured allow-lists, and swaps each
 * one for an order-preserving placeholder marker. The original content plus
 * its structural context is recorded as a `TranslatableUnit` so the rest of
 * the pipeline never has to touch the DOM again.
 */

use std::collections::{BTreeMap, HashSet};

use html5ever::parse_document;
use html5ever::serialize::{serialize, SerializeOpts};
use html5ever::tendril::{StrTendril, TendrilSink};
use log::debug;
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::app_config::ExtractionConfig;
use crate::errors::ExtractionError;

/// Elements whose subtrees are never translatable, regardless of allow-lists
const OPAQUE_TAGS: [&str; 3] = ["script", "style", "template"];

/// Marker-shaped ids already present in the input
static MARKER_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"TRANSLATION_ID_(\d+)").expect("marker pattern is valid"));

/// First id safe to assign for a given input
///
/// A document that happens to contain a marker-shaped comment would collide
/// with a fresh placeholder carrying the same id during merge; starting above
/// any pre-existing marker id keeps substitution unambiguous.
fn starting_id(html: &str) -> u32 {
    MARKER_ID_PATTERN
        .captures_iter(html)
        .filter_map(|captures| captures[1].parse::<u32>().ok())
        .map(|id| id.saturating_add(1))
        .max()
        .unwrap_or(0)
}

/// Build the placeholder marker embedding a unit id
///
/// The marker doubles as an HTML comment for text units and as a literal
/// attribute value for attribute units; both forms survive html5ever
/// serialization unchanged.
pub fn placeholder_for(id: u32) -> String {
    format!("<!-- TRANSLATION_ID_{} -->", id)
}

/// Kind of translatable fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// Direct text content of an allow-listed element
    Text,
    /// Value of an allow-listed attribute on any element
    Attribute,
}

/// Structural context surrounding a unit, forwarded to arbitration
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct UnitContext {
    /// Tag name of the owning element
    pub tag_name: String,
    /// Attribute map of the owning element at extraction time
    pub attributes: BTreeMap<String, String>,
}

/// One translatable fragment and its context; immutable once created
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatableUnit {
    /// Unique id, monotonically assigned in document order
    pub id: u32,
    /// Whether this unit came from a text node or an attribute value
    pub kind: UnitKind,
    /// Attribute name for `UnitKind::Attribute` units
    pub attribute_name: Option<String>,
    /// The untranslated content as it appeared in the document
    pub original_content: String,
    /// Surrounding structural context
    pub context: UnitContext,
}

/// Result of extraction: the marked-up document plus the ordered unit list
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    /// The document with every unit replaced by its placeholder
    pub processed_html: String,
    /// Units in document order; `units[i].id` matches placeholder i
    pub units: Vec<TranslatableUnit>,
}

/// Extract translatable units from an HTML document
///
/// Walks the DOM once in document order, so re-running on the same input with
/// the same allow-lists yields the same ids in the same order. A well-formed
/// document with zero matches returns an empty unit list, not an error.
pub fn extract(html: &str, config: &ExtractionConfig) -> Result<ExtractedDocument, ExtractionError> {
    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(|e| ExtractionError::Parse(e.to_string()))?;

    let mut walker = UnitWalker::new(config, starting_id(html));
    walker.walk(&dom.document);

    let processed_html = serialize_dom(&dom)?;
    debug!("Extracted {} translatable units", walker.units.len());

    Ok(ExtractedDocument {
        processed_html,
        units: walker.units,
    })
}

/// Serialize a DOM back to an HTML string
fn serialize_dom(dom: &RcDom) -> Result<String, ExtractionError> {
    let mut buf: Vec<u8> = Vec::new();
    let serializable: SerializableHandle = dom.document.clone().into();
    serialize(&mut buf, &serializable, SerializeOpts::default())
        .map_err(|e| ExtractionError::Parse(format!("Failed to serialize document: {}", e)))?;
    String::from_utf8(buf)
        .map_err(|e| ExtractionError::Parse(format!("Serialized document is not UTF-8: {}", e)))
}

/// Single-pass DOM walker that owns the unit counter
///
/// The counter lives on the walker for exactly one `extract` call, so ids
/// never depend on shared mutable state.
struct UnitWalker {
    text_tags: HashSet<String>,
    translatable_attributes: Vec<String>,
    next_id: u32,
    units: Vec<TranslatableUnit>,
}

impl UnitWalker {
    fn new(config: &ExtractionConfig, next_id: u32) -> Self {
        Self {
            text_tags: config.text_tags.iter().map(|t| t.to_lowercase()).collect(),
            translatable_attributes: config
                .translatable_attributes
                .iter()
                .map(|a| a.to_lowercase())
                .collect(),
            next_id,
            units: Vec::new(),
        }
    }

    fn walk(&mut self, node: &Handle) {
        match node.data {
            NodeData::Document => self.walk_children(node, None),
            NodeData::Element { ref name, .. } => {
                let tag_name = name.local.as_ref().to_lowercase();
                if OPAQUE_TAGS.contains(&tag_name.as_str()) {
                    return;
                }

                // Snapshot the context before any placeholder lands in the
                // attribute map; every unit of this element shares it
                let context = self.capture_context(node, &tag_name);
                self.process_attributes(node, &context);

                let text_translatable = self.text_tags.contains(&tag_name);
                self.walk_children(node, text_translatable.then_some(&context));
            }
            _ => {}
        }
    }

    /// Visit children in child order, so ids stay monotonic in document order
    ///
    /// Text children qualify when the parent tag is allow-listed; they are
    /// handled inline, interleaved with recursion into element children.
    fn walk_children(&mut self, node: &Handle, translatable_context: Option<&UnitContext>) {
        // Snapshot the child list: text children may be swapped for comments
        let children: Vec<Handle> = node.children.borrow().iter().cloned().collect();
        for (index, child) in children.iter().enumerate() {
            match child.data {
                NodeData::Text { ref contents } => {
                    let Some(context) = translatable_context else {
                        continue;
                    };
                    let text = contents.borrow().to_string();
                    if text.trim().is_empty() {
                        continue;
                    }
                    self.replace_text_child(node, index, text, context);
                }
                _ => self.walk(child),
            }
        }
    }

    /// Replace allow-listed, non-empty attribute values with placeholders
    fn process_attributes(&mut self, node: &Handle, context: &UnitContext) {
        let NodeData::Element { ref attrs, .. } = node.data else {
            return;
        };

        for attr_name in self.translatable_attributes.clone() {
            let original = {
                let attrs = attrs.borrow();
                attrs
                    .iter()
                    .find(|a| a.name.local.as_ref().eq_ignore_ascii_case(&attr_name))
                    .map(|a| a.value.to_string())
            };
            let Some(original) = original else { continue };
            if original.trim().is_empty() {
                continue;
            }

            let id = self.assign_id();
            let placeholder = placeholder_for(id);

            {
                let mut attrs = attrs.borrow_mut();
                if let Some(attr) = attrs
                    .iter_mut()
                    .find(|a| a.name.local.as_ref().eq_ignore_ascii_case(&attr_name))
                {
                    attr.value.clear();
                    attr.value.push_slice(&placeholder);
                }
            }

            self.units.push(TranslatableUnit {
                id,
                kind: UnitKind::Attribute,
                attribute_name: Some(attr_name.clone()),
                original_content: original,
                context: context.clone(),
            });
        }
    }

    /// Replace one qualifying text child with a placeholder comment node
    fn replace_text_child(
        &mut self,
        node: &Handle,
        index: usize,
        original: String,
        context: &UnitContext,
    ) {
        let id = self.assign_id();

        let comment = Node::new(NodeData::Comment {
            contents: StrTendril::from(format!(" TRANSLATION_ID_{} ", id).as_str()),
        });
        comment.parent.set(Some(std::rc::Rc::downgrade(node)));
        node.children.borrow_mut()[index] = comment;

        self.units.push(TranslatableUnit {
            id,
            kind: UnitKind::Text,
            attribute_name: None,
            original_content: original,
            context: context.clone(),
        });
    }

    fn capture_context(&self, node: &Handle, tag_name: &str) -> UnitContext {
        let mut attributes = BTreeMap::new();
        if let NodeData::Element { ref attrs, .. } = node.data {
            for attr in attrs.borrow().iter() {
                attributes.insert(attr.name.local.to_string(), attr.value.to_string());
            }
        }
        UnitContext {
            tag_name: tag_name.to_string(),
            attributes,
        }
    }

    fn assign_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}
