/// Search engine for the rulebook site.
///
/// Every search fetches and parses each configured page, keeps the single best-scoring
/// block per page, then orders pages by exact heading match, page priority and score.
/// Nothing is cached between searches.
use std::cmp::Ordering;

use futures::future::join_all;
use site_common::document::{Document, NodeId};
use site_common::http::PageSource;
use tracing::{debug, info};

use crate::fetcher::fetch_document;
use crate::highlight::{find_case_insensitive, fold_case, lowercase_char_offset};
use crate::model::{PageDescriptor, SearchCandidate};
use crate::pages::PagePriority;
use crate::snippet::{build_snippet, is_heading};

/// Tags treated as searchable blocks.
const BLOCK_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6", "p", "li", "th", "td"];

/// Regions whose blocks are never matched (sidebars, navigation).
const EXCLUDED_REGIONS: &[&str] = &["aside", "nav"];

const POSITION_BUDGET: i64 = 1000;
const BLOCK_PENALTY: i64 = 5;

pub struct SiteSearch<S> {
    source: S,
    pages: Vec<PageDescriptor>,
    priority: PagePriority,
}

impl<S: PageSource> SiteSearch<S> {
    pub fn new(source: S, pages: &[PageDescriptor], priority: PagePriority) -> Self {
        Self {
            source,
            pages: pages.to_vec(),
            priority,
        }
    }

    #[cfg(test)]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Search every configured page and return at most one candidate per page, ranked.
    ///
    /// A blank query returns immediately without fetching anything. Pages that fail to
    /// load simply contribute nothing.
    pub async fn search_site(&self, query: &str) -> Vec<SearchCandidate> {
        let query_lower = fold_case(query.trim());
        if query_lower.is_empty() {
            return Vec::new();
        }

        let searches = self
            .pages
            .iter()
            .map(|page| self.search_page(page, &query_lower));
        let mut results: Vec<SearchCandidate> = join_all(searches).await.into_iter().flatten().collect();

        // Vec::sort_by is stable, so equal keys keep page configuration order.
        results.sort_by(|a, b| compare_candidates(a, b, &self.priority));

        info!(query = %query_lower, results = results.len(), "site search complete");
        results
    }

    /// Best candidate on one page, or `None` when the page has no match or fails to load.
    pub async fn search_page(&self, page: &PageDescriptor, query_lower: &str) -> Option<SearchCandidate> {
        let doc = fetch_document(&self.source, page.url).await?;
        let best = best_candidate(&doc, page, query_lower);
        debug!(
            page = page.url,
            matched = best.is_some(),
            score = ?best.as_ref().map(|c| c.score),
            "page searched"
        );
        best
    }
}

/// Cross-page ordering: exact heading matches first, then page priority (lower first),
/// then score (higher first).
pub fn compare_candidates(a: &SearchCandidate, b: &SearchCandidate, priority: &PagePriority) -> Ordering {
    b.exact_heading_match
        .cmp(&a.exact_heading_match)
        .then_with(|| priority.rank(&a.page_url).cmp(&priority.rank(&b.page_url)))
        .then_with(|| b.score.cmp(&a.score))
}

/// Walk the page's blocks in document order and keep the highest-scoring match.
/// On equal scores the earliest block wins.
pub fn best_candidate(doc: &Document, page: &PageDescriptor, query_lower: &str) -> Option<SearchCandidate> {
    let mut section_title: Option<String> = None;
    let mut section_id: Option<String> = None;
    let mut best: Option<SearchCandidate> = None;

    let blocks = doc
        .elements()
        .filter(|&n| doc.tag(n).is_some_and(|t| BLOCK_TAGS.contains(&t)));

    for (block_index, el) in blocks.enumerate() {
        if in_excluded_region(doc, el) {
            continue;
        }
        let Some(tag) = doc.tag(el) else {
            continue;
        };

        let text = doc.text_content(el);

        if is_heading(tag) {
            section_title = Some(text.trim().to_string());
            section_id = section_anchor(doc, el);
        }

        let Some(hit) = find_case_insensitive(&text, query_lower, 0) else {
            continue;
        };
        let match_offset = lowercase_char_offset(&text, hit.start);

        let exact_heading_match =
            matches!(tag, "h1" | "h2" | "h3" | "h4") && fold_case(text.trim()) == query_lower;

        let url = match &section_id {
            Some(id) => format!("{}#{}", page.url, id),
            None => page.url.to_string(),
        };

        let candidate = SearchCandidate {
            title: page.title.to_string(),
            page_url: page.url.to_string(),
            section_title: section_title.clone(),
            section_id: section_id.clone(),
            url,
            snippet_html: build_snippet(doc, el, tag, query_lower),
            score: score(tag, block_index, match_offset),
            exact_heading_match,
        };

        if best.as_ref().map_or(true, |b| candidate.score > b.score) {
            best = Some(candidate);
        }
    }

    best
}

/// `tag_weight * 1000 + max(0, 1000 - 5 * block_index - match_offset)`
pub fn score(tag: &str, block_index: usize, match_offset: usize) -> i64 {
    let tag_weight = if is_heading(tag) {
        3
    } else if matches!(tag, "p" | "li") {
        2
    } else {
        1
    };
    let block_index = i64::try_from(block_index).unwrap_or(i64::MAX / BLOCK_PENALTY);
    let match_offset = i64::try_from(match_offset).unwrap_or(i64::MAX);
    let position_bonus = POSITION_BUDGET
        .saturating_sub(BLOCK_PENALTY.saturating_mul(block_index))
        .saturating_sub(match_offset)
        .max(0);
    tag_weight * 1000 + position_bonus
}

fn in_excluded_region(doc: &Document, el: NodeId) -> bool {
    doc.closest(el, |d, n| d.tag(n).is_some_and(|t| EXCLUDED_REGIONS.contains(&t)))
        .is_some()
}

fn is_section_container(doc: &Document, node: NodeId) -> bool {
    matches!(doc.tag(node), Some("article" | "section"))
        || doc.has_class(node, "card")
        || doc.element_id(node).is_some()
}

/// Anchor for a heading: the id of its nearest sectioning ancestor, else its own id.
fn section_anchor(doc: &Document, heading: NodeId) -> Option<String> {
    let container = doc
        .ancestors(heading)
        .find(|&n| doc.is_element(n) && is_section_container(doc, n))
        .unwrap_or(heading);
    doc.element_id(container).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::{PAGES, PAGE_PRIORITY};
    use crate::testing::StaticSite;

    const PAGE: PageDescriptor = PageDescriptor {
        title: "Stats & Skills",
        url: "skills.html",
    };

    fn candidate(page_url: &str, score: i64, exact: bool) -> SearchCandidate {
        SearchCandidate {
            title: page_url.to_string(),
            page_url: page_url.to_string(),
            section_title: None,
            section_id: None,
            url: page_url.to_string(),
            snippet_html: String::new(),
            score,
            exact_heading_match: exact,
        }
    }

    #[test]
    fn score_formula() {
        assert_eq!(score("h2", 0, 0), 4000);
        assert_eq!(score("p", 3, 10), 2000 + 1000 - 15 - 10);
        assert_eq!(score("li", 0, 0), 3000);
        assert_eq!(score("td", 0, 0), 2000);
        assert_eq!(score("p", 500, 0), 2000);
        assert_eq!(score("th", 10, 2000), 1000);
    }

    #[test]
    fn heading_match_tracks_section_and_exactness() {
        let doc = Document::parse(
            "<article id=\"stats\"><div class=\"card\" id=\"might\"><h2>Might</h2>\
             <p>Might measures raw physical power. It affects carrying capacity.</p></div></article>",
        );
        let c = best_candidate(&doc, &PAGE, "might").expect("match");
        assert_eq!(c.section_title.as_deref(), Some("Might"));
        assert_eq!(c.section_id.as_deref(), Some("might"));
        assert_eq!(c.url, "skills.html#might");
        assert!(c.exact_heading_match);
        assert_eq!(c.score, 3000 + 1000);
        assert!(c.snippet_html.contains("— Might measures raw physical power."));
        assert!(!c.snippet_html.contains("carrying"));
    }

    #[test]
    fn section_falls_back_to_heading_id_or_none() {
        let doc = Document::parse("<h2 id=\"armor\">Armor</h2><p>Plate armor is heavy.</p>");
        let c = best_candidate(&doc, &PAGE, "plate").expect("match");
        assert_eq!(c.section_id.as_deref(), Some("armor"));
        assert_eq!(c.section_title.as_deref(), Some("Armor"));

        let doc = Document::parse("<h2>Armor</h2><p>Plate armor is heavy.</p>");
        let c = best_candidate(&doc, &PAGE, "plate").expect("match");
        assert_eq!(c.section_id, None);
        assert_eq!(c.url, "skills.html");
    }

    #[test]
    fn section_container_without_id_gives_no_anchor() {
        let doc = Document::parse(
            "<div id=\"outer\"><section><h2 id=\"inner\">Rest</h2><p>Resting heals.</p></section></div>",
        );
        let c = best_candidate(&doc, &PAGE, "heals").expect("match");
        assert_eq!(c.section_title.as_deref(), Some("Rest"));
        assert_eq!(c.section_id, None);
    }

    #[test]
    fn aside_blocks_are_skipped_but_counted() {
        let doc = Document::parse(
            "<aside><h3>Torch</h3><p>torch link</p></aside><p>A torch lights the way.</p>",
        );
        let c = best_candidate(&doc, &PAGE, "torch").expect("match");
        assert_eq!(c.section_title, None);
        // third block (index 2), match at char 2
        assert_eq!(c.score, 2000 + 1000 - 10 - 2);
        assert!(c.snippet_html.starts_with("A <span"));
    }

    #[test]
    fn nav_blocks_are_skipped_but_counted() {
        let doc = Document::parse("<nav><p>torch</p></nav><p>torch x</p>");
        let c = best_candidate(&doc, &PAGE, "torch").expect("match");
        // second block (index 1), match at char 0
        assert_eq!(c.score, 2000 + 1000 - 5);
        assert!(c.snippet_html.ends_with("</span> x"));
    }

    #[test]
    fn word_final_sigma_matches_and_counts_as_exact_heading() {
        let doc = Document::parse("<h2>ΟΔΟΣ</h2>");
        let c = best_candidate(&doc, &PAGE, &fold_case("ΟΔΟΣ")).expect("match");
        assert!(c.exact_heading_match);
        assert_eq!(c.score, 4000);
    }

    #[tokio::test]
    async fn site_search_folds_query_like_page_text() {
        let site = StaticSite::default().with("exploration.html", "<h3>Ο δρόμος ΟΔΟΣ</h3><h2>ΟΔΟΣ</h2>");
        let search = SiteSearch::new(site, PAGES, PagePriority::default());
        let results = search.search_site(" ΟΔΟΣ ").await;
        assert_eq!(results.len(), 1);
        assert!(results[0].exact_heading_match);
    }

    #[test]
    fn best_block_wins_and_ties_keep_first() {
        let doc = Document::parse("<p>fire one</p><p>fire two</p><h3>Fire</h3>");
        let c = best_candidate(&doc, &PAGE, "fire").expect("match");
        assert_eq!(c.section_title.as_deref(), Some("Fire"));
        assert_eq!(c.score, 3000 + 1000 - 10);

        let doc = Document::parse("<table><tr><td>xfire</td><td>fire</td></tr></table>");
        let c = best_candidate(&doc, &PAGE, "fire").expect("match");
        assert_eq!(c.score, 1000 + 1000 - 1);

        let doc = Document::parse("<ul><li>ab fire</li><li>fire</li></ul>");
        // index 0 offset 3 -> 997; index 1 offset 0 -> 995
        let c = best_candidate(&doc, &PAGE, "fire").expect("match");
        assert!(c.snippet_html.starts_with("ab "));
    }

    #[test]
    fn equal_scores_keep_earliest_block() {
        // index 0 offset 5 and index 1 offset 0 both give a 995 bonus
        let doc = Document::parse("<p>abcd fire</p><p>fire</p>");
        let c = best_candidate(&doc, &PAGE, "fire").expect("match");
        assert_eq!(c.score, 2995);
        assert!(c.snippet_html.starts_with("abcd "));
    }

    #[test]
    fn no_match_returns_none() {
        let doc = Document::parse("<p>Nothing here.</p>");
        assert!(best_candidate(&doc, &PAGE, "dragon").is_none());
    }

    #[test]
    fn ranking_puts_exact_headings_first_then_priority_then_score() {
        let priority = PagePriority::new(PAGE_PRIORITY, 4);
        let mut results = vec![
            candidate("magic.html", 3990, false),
            candidate("gear.html", 1000, true),
            candidate("basics.html", 2100, false),
            candidate("skills.html", 2500, false),
            candidate("armory.html", 3000, false),
            candidate("crafting.html", 3500, false),
        ];
        results.sort_by(|a, b| compare_candidates(a, b, &priority));
        let order: Vec<&str> = results.iter().map(|c| c.page_url.as_str()).collect();
        assert_eq!(
            order,
            ["gear.html", "basics.html", "skills.html", "magic.html", "crafting.html", "armory.html"]
        );
    }

    #[test]
    fn ranking_is_stable_for_equal_keys() {
        let priority = PagePriority::new(PAGE_PRIORITY, 4);
        let mut results = vec![
            candidate("gear.html", 2000, false),
            candidate("knowledge.html", 2000, false),
        ];
        results.sort_by(|a, b| compare_candidates(a, b, &priority));
        assert_eq!(results[0].page_url, "gear.html");
        assert_eq!(results[1].page_url, "knowledge.html");
    }

    #[tokio::test]
    async fn blank_query_fetches_nothing() {
        let search = SiteSearch::new(StaticSite::default(), PAGES, PagePriority::default());
        assert!(search.search_site("   ").await.is_empty());
        assert!(search.search_site("").await.is_empty());
        assert_eq!(search.source().fetch_count(), 0);
    }

    #[tokio::test]
    async fn failed_pages_are_left_out() {
        let site = StaticSite::default()
            .with("magic.html", "<p>Fire magic burns.</p>")
            .with("armory.html", "<table><tr><td>Flamberge</td><td>fire damage</td></tr></table>");
        let search = SiteSearch::new(site, PAGES, PagePriority::default());

        let results = search.search_site("Fire").await;
        let pages: Vec<&str> = results.iter().map(|c| c.page_url.as_str()).collect();
        assert_eq!(pages, ["magic.html", "armory.html"]);
        assert!(results[1].snippet_html.contains("Flamberge"));
        assert_eq!(search.source().fetch_count(), PAGES.len());
    }

    #[tokio::test]
    async fn exact_basics_heading_ranks_first() {
        let site = StaticSite::default()
            .with(
                "basics.html",
                "<main><p>Intro text.</p><p>More.</p><p>Even more.</p>\
                 <section id=\"basics\"><h1>Basics</h1><p>The basics of play.</p></section></main>",
            )
            .with("index.html", "<h2>Rulebook basics</h2>")
            .with("skills.html", "<h2>Skill basics and more</h2>");
        let search = SiteSearch::new(site, PAGES, PagePriority::default());

        let results = search.search_site("  basics ").await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].page_url, "basics.html");
        assert!(results[0].exact_heading_match);
        assert_eq!(results[0].url, "basics.html#basics");
        assert_eq!(results[1].page_url, "skills.html");
        assert_eq!(results[2].page_url, "index.html");
        assert!(results[2].score > results[0].score);
    }

    #[tokio::test]
    async fn repeated_searches_are_identical() {
        let site = StaticSite::default()
            .with("perks.html", "<h3>Iron Will</h3><p>Resist fear.</p>")
            .with("downtime.html", "<ul><li>Train will power.</li></ul>");
        let search = SiteSearch::new(site, PAGES, PagePriority::default());

        let first = search.search_site("will").await;
        let second = search.search_site("will").await;
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }
}
