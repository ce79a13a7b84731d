//! Document fact extraction.
//!
//! Walks the parsed instance document once and produces the flat, ordered
//! sequence of raw facts together with the taxonomy date marker.

use std::sync::LazyLock;

use facts_core::{FactError, RawFact, Result};
use regex::Regex;
use roxmltree::{Document, Node};

/// XBRL instance namespace.
pub(crate) const XBRLI_NS: &str = "http://www.xbrl.org/2003/instance";
/// XBRL linkbase namespace.
const LINKBASE_NS: &str = "http://www.xbrl.org/2003/linkbase";
/// XLink namespace.
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Date marker inside a schema reference.
static TAXONOMY_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("valid regex"));

/// Elements that carry structure rather than disclosed values.
const STRUCTURAL_ELEMENTS: [&str; 3] = ["context", "unit", "schemaRef"];

/// Facts and identity extracted from one instance document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedDocument {
    /// Filing identifier, supplied by the caller.
    pub doc_id: String,
    /// First `YYYY-MM-DD` found in the schema reference.
    pub taxonomy_version: Option<String>,
    /// Facts in document order.
    pub facts: Vec<RawFact>,
}

/// Parses instance document text into a document tree.
///
/// # Errors
/// Returns [`FactError::Xml`] if the text is not well-formed, and
/// [`FactError::StructurallyAbsent`] if the root is not an `xbrl` element.
pub fn parse_document<'input>(doc_id: &str, text: &'input str) -> Result<Document<'input>> {
    let document = Document::parse(text).map_err(|e| FactError::Xml {
        doc_id: doc_id.to_string(),
        message: e.to_string(),
    })?;

    let root = document.root_element().tag_name().name();
    if root != "xbrl" {
        return Err(FactError::StructurallyAbsent {
            doc_id: doc_id.to_string(),
            reason: format!("root element is '{root}', expected 'xbrl'"),
        });
    }

    Ok(document)
}

/// Extracts every fact from a parsed instance document.
///
/// A fact is any element with a `contextRef` attribute outside the linkbase
/// and XLink namespaces that is not itself a context, unit, or schema reference.
#[must_use]
pub fn extract_facts(document: &Document<'_>, doc_id: &str) -> ExtractedDocument {
    let facts = document
        .root_element()
        .descendants()
        .filter(|node| is_fact(node))
        .filter_map(|node| to_raw_fact(&node))
        .collect();

    ExtractedDocument {
        doc_id: doc_id.to_string(),
        taxonomy_version: taxonomy_version(document),
        facts,
    }
}

fn is_fact(node: &Node<'_, '_>) -> bool {
    if !node.is_element() || !node.has_attribute("contextRef") {
        return false;
    }
    let tag = node.tag_name();
    if matches!(tag.namespace(), Some(LINKBASE_NS | XLINK_NS)) {
        return false;
    }
    !STRUCTURAL_ELEMENTS.contains(&tag.name())
}

fn to_raw_fact(node: &Node<'_, '_>) -> Option<RawFact> {
    let context_ref = node.attribute("contextRef")?;
    let tag = node.tag_name();
    let qualified = match tag.namespace().and_then(|ns| node.lookup_prefix(ns)) {
        Some(prefix) => format!("{prefix}:{}", tag.name()),
        None => tag.name().to_string(),
    };

    Some(RawFact {
        tag: qualified,
        context_ref: context_ref.to_string(),
        unit_ref: node.attribute("unitRef").map(str::to_string),
        decimals: node.attribute("decimals").map(str::to_string),
        value: node.text().unwrap_or_default().trim().to_string(),
    })
}

fn taxonomy_version(document: &Document<'_>) -> Option<String> {
    let href = document
        .root_element()
        .descendants()
        .find(|node| node.has_tag_name((LINKBASE_NS, "schemaRef")))
        .and_then(|node| node.attribute((XLINK_NS, "href")));

    href.and_then(|href| TAXONOMY_DATE.find(href))
        .map(|m| m.as_str().to_string())
}
