/// Results markup and the views that display it.
use std::io::Write;

use tracing::warn;

use crate::config::OutputFormat;
use crate::highlight::escape_html;
use crate::model::SearchCandidate;

/// Display surface for search results. Every call replaces whatever was shown before.
pub trait ResultsView: Send + Sync {
    /// Show `results` for `query`. The query may be blank, meaning "show nothing".
    fn show(&self, query: &str, results: &[SearchCandidate]);

    /// Show a plain message, e.g. the outcome of a section jump.
    fn notice(&self, message: &str);

    fn clear(&self);
}

/// Results markup for `query`. Empty for a blank query.
///
/// Snippets are inserted verbatim: they are built from page content by the highlighter and
/// never contain unescaped query text. Everything else is escaped here.
pub fn render_results(results: &[SearchCandidate], query: &str) -> String {
    if query.trim().is_empty() {
        return String::new();
    }

    let query = escape_html(query);
    if results.is_empty() {
        return format!("<p class=\"search-empty\">No results found for \"{query}\".</p>");
    }

    let mut out = format!("<p class=\"search-count\">Results for \"{query}\":</p>\n");
    for result in results {
        out.push_str(&format!(
            "<div class=\"search-result\"><a class=\"search-result-title\" href=\"{}\">{}</a>\
             <p class=\"search-result-snippet\">{}</p></div>\n",
            escape_attr(&result.url),
            escape_html(&result.label()),
            result.snippet_html
        ));
    }
    out
}

fn escape_attr(value: &str) -> String {
    escape_html(value).replace('"', "&quot;")
}

/// Writes each render to stdout, HTML markup or one JSON array per line.
pub struct StdoutView {
    format: OutputFormat,
}

impl StdoutView {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn write(&self, text: &str) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, "{text}").and_then(|()| out.flush()) {
            warn!(error = %e, "failed to write results");
        }
    }
}

impl ResultsView for StdoutView {
    fn show(&self, query: &str, results: &[SearchCandidate]) {
        match self.format {
            OutputFormat::Html => self.write(&render_results(results, query)),
            OutputFormat::Json => match serde_json::to_string(results) {
                Ok(json) => self.write(&json),
                Err(e) => warn!(error = %e, "failed to serialize results"),
            },
        }
    }

    fn notice(&self, message: &str) {
        match self.format {
            OutputFormat::Html => self.write(&format!("<p class=\"search-notice\">{}</p>", escape_html(message))),
            OutputFormat::Json => self.write(&serde_json::json!({ "notice": message }).to_string()),
        }
    }

    fn clear(&self) {
        match self.format {
            OutputFormat::Html => self.write(""),
            OutputFormat::Json => self.write("[]"),
        }
    }
}
