//! In-memory page sources for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use site_common::error::CommonError;
use site_common::http::PageSource;

/// A fixed set of pages. Unknown URLs fail the way an unreachable page would.
#[derive(Default)]
pub struct StaticSite {
    pages: HashMap<&'static str, String>,
    delays: HashMap<&'static str, Duration>,
    fetches: AtomicUsize,
    answered: AtomicUsize,
}

impl StaticSite {
    pub fn with(mut self, url: &'static str, html: &str) -> Self {
        self.pages.insert(url, html.to_string());
        self
    }

    /// Make fetches of `url` take `delay` before answering.
    pub fn with_delay(mut self, url: &'static str, delay: Duration) -> Self {
        self.delays.insert(url, delay);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Fetches that ran to completion, delay included.
    pub fn answered_count(&self) -> usize {
        self.answered.load(Ordering::SeqCst)
    }
}

impl PageSource for StaticSite {
    async fn fetch_html(&self, url: &str) -> Result<String, CommonError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }
        self.answered.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| CommonError::Unavailable(url.to_string()))
    }
}
