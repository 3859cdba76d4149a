use site_common::document::Document;
use site_common::http::PageSource;
use tracing::warn;

/// Fetch and parse one page. Any failure is logged and reported as `None`, which callers
/// treat as "no matches on this page".
pub async fn fetch_document<S: PageSource>(source: &S, url: &str) -> Option<Document> {
    let html = source
        .fetch_html(url)
        .await
        .inspect_err(|e| warn!(url, error = %e, "could not fetch page"))
        .ok()?;
    Some(Document::parse(&html))
}

#[cfg(test)]
mod tests {
    use super::*;
    use site_common::error::CommonError;

    struct OnePage;

    impl PageSource for OnePage {
        async fn fetch_html(&self, url: &str) -> Result<String, CommonError> {
            match url {
                "ok.html" => Ok("<h1>Basics</h1>".to_string()),
                _ => Err(CommonError::Unavailable(url.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn failure_yields_no_document() {
        assert!(fetch_document(&OnePage, "missing.html").await.is_none());
        let doc = fetch_document(&OnePage, "ok.html").await.expect("document");
        assert_eq!(doc.text_content(doc.root()), "Basics");
    }
}
