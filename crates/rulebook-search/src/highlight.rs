/// Term highlighting over document subtrees.
///
/// Matching is case-insensitive against an already-lowercased query. Offsets are computed
/// on the original text so that highlighted spans keep the source casing and slicing never
/// lands inside a multi-byte character.
use std::ops::Range;

use site_common::document::{Document, NodeData, NodeId};

/// CSS class carried by every highlighted span.
pub const HIGHLIGHT_CLASS: &str = "search-highlight";

/// Byte range in `text` of the first case-insensitive occurrence of `needle_lower` that
/// starts at or after byte `from`.
///
/// A match must cover whole characters of `text`: a character whose lowercase form is
/// longer than one `char` only matches if the needle covers all of it.
pub fn find_case_insensitive(text: &str, needle_lower: &str, from: usize) -> Option<Range<usize>> {
    if needle_lower.is_empty() || from > text.len() {
        return None;
    }
    text[from..]
        .char_indices()
        .map(|(offset, _)| from + offset)
        .find_map(|start| match_at(text, start, needle_lower).map(|end| start..end))
}

fn match_at(text: &str, start: usize, needle_lower: &str) -> Option<usize> {
    let mut want = needle_lower.chars().peekable();
    for (offset, c) in text[start..].char_indices() {
        for lower in c.to_lowercase() {
            if want.next() != Some(lower) {
                return None;
            }
        }
        if want.peek().is_none() {
            return Some(start + offset + c.len_utf8());
        }
    }
    None
}

/// Lowercase `text` one `char` at a time, the same folding `find_case_insensitive` applies
/// to the text it searches. Unlike `str::to_lowercase`, a word-final `Σ` stays `σ`.
pub fn fold_case(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

/// Offset of a match counted in characters of the lowercased text.
pub fn lowercase_char_offset(text: &str, byte_offset: usize) -> usize {
    text[..byte_offset].chars().flat_map(char::to_lowercase).count()
}

/// Escape text for embedding in markup. Only `&`, `<` and `>` are touched.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Inner markup of a copy of `element` with every occurrence of `query_lower` wrapped in
/// a highlight span. `doc` is left untouched.
pub fn highlight(doc: &Document, element: NodeId, query_lower: &str) -> String {
    let mut copy = doc.subtree(element);
    let root = copy.root();

    let text_nodes: Vec<NodeId> = copy
        .descendants(root)
        .filter(|&n| matches!(copy.data(n), NodeData::Text(_)))
        .collect();

    for node in text_nodes {
        let NodeData::Text(text) = copy.data(node) else {
            continue;
        };
        let runs = split_runs(text, query_lower);
        if runs.is_empty() {
            continue;
        }

        let mut replacements = Vec::with_capacity(runs.len());
        for run in runs {
            match run {
                Run::Plain(s) => replacements.push(copy.create_text(s)),
                Run::Hit(s) => {
                    let span = copy.create_element("span", &[("class", HIGHLIGHT_CLASS)]);
                    let inner = copy.create_text(s);
                    copy.append_child(span, inner);
                    replacements.push(span);
                }
            }
        }
        copy.replace_with(node, &replacements);
    }

    copy.inner_html(root)
}

#[derive(Debug, PartialEq, Eq)]
enum Run {
    Plain(String),
    Hit(String),
}

/// Split `text` into plain and highlighted runs. Empty when there is no occurrence.
fn split_runs(text: &str, query_lower: &str) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut last = 0;
    while let Some(hit) = find_case_insensitive(text, query_lower, last) {
        if hit.start > last {
            runs.push(Run::Plain(text[last..hit.start].to_string()));
        }
        runs.push(Run::Hit(text[hit.clone()].to_string()));
        last = hit.end;
    }
    if runs.is_empty() {
        return runs;
    }
    if last < text.len() {
        runs.push(Run::Plain(text[last..].to_string()));
    }
    runs
}
