use std::sync::LazyLock;

use regex::Regex;
use site_common::document::{Document, NodeId};

use crate::highlight::{escape_html, highlight};

static SENTENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.+?[.!?])(\s|$)").expect("valid regex"));

pub fn is_heading(tag: &str) -> bool {
    matches!(tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

pub fn is_table_cell(tag: &str) -> bool {
    matches!(tag, "td" | "th")
}

/// Snippet markup for a matched block.
///
/// - headings: the highlighted heading in bold, plus the first sentence of the paragraph
///   that follows it within the same section
/// - table cells: the whole highlighted row, so neighbouring columns give context
/// - anything else: the highlighted element
pub fn build_snippet(doc: &Document, element: NodeId, tag: &str, query_lower: &str) -> String {
    if is_heading(tag) {
        let heading_html = highlight(doc, element, query_lower);
        return match following_paragraph(doc, element).and_then(|p| first_sentence(&doc.text_content(p))) {
            Some(sentence) => format!("<strong>{heading_html}</strong> — {}", escape_html(&sentence)),
            None => format!("<strong>{heading_html}</strong>"),
        };
    }

    if is_table_cell(tag) {
        let row = doc.closest(element, |d, n| d.tag(n) == Some("tr"));
        return highlight(doc, row.unwrap_or(element), query_lower);
    }

    highlight(doc, element, query_lower)
}

/// First `<p>` among the heading's following siblings, stopping at the next heading.
fn following_paragraph(doc: &Document, heading: NodeId) -> Option<NodeId> {
    let mut sibling = doc.next_element_sibling(heading);
    while let Some(node) = sibling {
        match doc.tag(node) {
            Some("p") => return Some(node),
            Some(tag) if is_heading(tag) => return None,
            _ => sibling = doc.next_element_sibling(node),
        }
    }
    None
}

/// Text up to and including the first `.`, `!` or `?` that is followed by whitespace or
/// the end of the text. Falls back to the whole trimmed text; `None` if that is empty.
pub fn first_sentence(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let sentence = SENTENCE_RE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map_or(trimmed, |m| m.as_str())
        .trim();
    Some(sentence.to_string())
}
