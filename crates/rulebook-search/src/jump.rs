use site_common::document::{Document, NodeId};

use crate::highlight::{find_case_insensitive, fold_case};

/// Containers whose links count as section shortcuts.
const LINK_LISTS: &[&str] = &["link-list", "contents-list"];

/// In-page "jump to section": the first h1-h4 heading or contents-list link whose text
/// contains the query. A matching link with a `#id` href resolves to the element it points
/// at, when that element exists.
pub fn find_jump_target(doc: &Document, query: &str) -> Option<NodeId> {
    let query_lower = fold_case(query.trim());
    if query_lower.is_empty() {
        return None;
    }

    let hit = doc.elements().filter(|&n| is_jump_candidate(doc, n)).find(|&n| {
        find_case_insensitive(&doc.text_content(n), &query_lower, 0).is_some()
    })?;

    let linked = doc
        .attr(hit, "href")
        .and_then(|href| href.strip_prefix('#'))
        .and_then(|id| doc.element_by_id(id));
    Some(linked.unwrap_or(hit))
}

fn is_jump_candidate(doc: &Document, node: NodeId) -> bool {
    match doc.tag(node) {
        Some("h1" | "h2" | "h3" | "h4") => true,
        Some("a") => doc
            .ancestors(node)
            .any(|n| LINK_LISTS.iter().any(|class| doc.has_class(n, class))),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "<nav><ul class=\"contents-list\">\
        <li><a href=\"#might\">Might</a></li><li><a href=\"#grace\">Grace and poise</a></li>\
        <li><a href=\"#missing\">Lore</a></li></ul></nav>\
        <a href=\"#grace\">Stray grace link</a>\
        <section id=\"might\"><h2>Might</h2></section>\
        <section id=\"grace\"><h2>Grace</h2></section>\
        <section><h3>Wits</h3></section>";

    #[test]
    fn link_resolves_to_its_target_section() {
        let doc = Document::parse(PAGE);
        let target = find_jump_target(&doc, "poise").expect("target");
        assert_eq!(doc.element_id(target), Some("grace"));
    }

    #[test]
    fn first_candidate_in_document_order_wins() {
        let doc = Document::parse(PAGE);
        let target = find_jump_target(&doc, "MIGHT").expect("target");
        assert_eq!(doc.tag(target), Some("section"));
        assert_eq!(doc.element_id(target), Some("might"));
    }

    #[test]
    fn heading_without_link_is_its_own_target() {
        let doc = Document::parse(PAGE);
        let target = find_jump_target(&doc, "wits").expect("target");
        assert_eq!(doc.tag(target), Some("h3"));
    }

    #[test]
    fn dangling_link_targets_the_link_itself() {
        let doc = Document::parse(PAGE);
        let target = find_jump_target(&doc, "lore").expect("target");
        assert_eq!(doc.tag(target), Some("a"));
    }

    #[test]
    fn word_final_sigma_in_query_finds_heading() {
        let doc = Document::parse("<section id=\"road\"><h2>ΟΔΟΣ</h2></section>");
        let target = find_jump_target(&doc, "ΟΔΟΣ").expect("target");
        assert_eq!(doc.tag(target), Some("h2"));
    }

    #[test]
    fn links_outside_contents_lists_and_blank_queries_are_ignored() {
        let doc = Document::parse(PAGE);
        assert_eq!(find_jump_target(&doc, "stray"), None);
        assert_eq!(find_jump_target(&doc, "  "), None);
    }
}
