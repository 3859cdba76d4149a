use serde::Serialize;

/// One searchable page of the rulebook site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageDescriptor {
    /// Display title, e.g. "Stats & Skills"
    pub title: &'static str,
    /// Page URL relative to the site base, e.g. "skills.html"
    pub url: &'static str,
}

/// The best match found on one page during one search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchCandidate {
    /// Page title from the descriptor
    pub title: String,
    /// Page URL without fragment
    pub page_url: String,
    /// Text of the nearest heading at or before the matched block
    pub section_title: Option<String>,
    /// Anchor id of the section container owning that heading
    pub section_id: Option<String>,
    /// `page_url`, plus `#section_id` when a section id is known
    pub url: String,
    /// Highlighted snippet markup, built only from page content
    pub snippet_html: String,
    /// Page-local relevance score (higher is better)
    pub score: i64,
    /// The whole text of an h1-h4 heading equals the query
    pub exact_heading_match: bool,
}

impl SearchCandidate {
    /// Link label shown for the result, e.g. "Stats & Skills | Might".
    pub fn label(&self) -> String {
        match &self.section_title {
            Some(section) => format!("{} | {}", self.title, section),
            None => self.title.clone(),
        }
    }
}
