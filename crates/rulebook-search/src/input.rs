/// Search box behaviour: debounced search-as-you-type, immediate submit, and clear.
///
/// Each input event replaces the pending (not yet fired) run. A pending run is told to stop
/// over a oneshot channel raced against its debounce sleep, so once the sleep wins the run
/// is never cancelled. Every event bumps a generation counter, and a finished run only
/// renders if no newer event has happened since it was scheduled.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use site_common::http::PageSource;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::render::ResultsView;
use crate::search::SiteSearch;

struct ScheduledRun {
    handle: JoinHandle<()>,
    cancel: Option<oneshot::Sender<()>>,
}

pub struct SearchInput<S, V> {
    search: Arc<SiteSearch<S>>,
    view: Arc<V>,
    debounce: Duration,
    generation: Arc<AtomicU64>,
    runs: Vec<ScheduledRun>,
}

impl<S, V> SearchInput<S, V>
where
    S: PageSource + 'static,
    V: ResultsView + 'static,
{
    pub fn new(search: Arc<SiteSearch<S>>, view: Arc<V>, debounce: Duration) -> Self {
        Self {
            search,
            view,
            debounce,
            generation: Arc::new(AtomicU64::new(0)),
            runs: Vec::new(),
        }
    }

    /// The input's value changed. Runs the search once the debounce window passes quietly.
    pub fn on_input(&mut self, value: &str) {
        self.schedule(value, self.debounce);
    }

    /// The form was submitted. Runs the search right away.
    pub fn on_submit(&mut self, value: &str) {
        self.schedule(value, Duration::ZERO);
    }

    /// The clear button was pressed: drop any pending run and empty the results.
    pub fn on_clear(&mut self) {
        self.cancel_pending();
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.view.clear();
    }

    /// Wait for every scheduled and in-flight run to finish.
    pub async fn settle(&mut self) {
        for run in self.runs.drain(..) {
            if let Err(e) = run.handle.await {
                warn!(error = %e, "search run did not complete");
            }
        }
    }

    fn schedule(&mut self, value: &str, delay: Duration) {
        self.cancel_pending();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let (cancel, cancelled) = oneshot::channel();
        let run = SearchRun {
            search: Arc::clone(&self.search),
            view: Arc::clone(&self.view),
            current: Arc::clone(&self.generation),
            generation,
            query: value.to_string(),
        };
        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancelled => {
                    debug!(generation, "pending search cancelled");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }
            run.execute().await;
        });

        self.runs.push(ScheduledRun {
            handle,
            cancel: Some(cancel),
        });
    }

    /// Signal every run still waiting out its debounce to stop; forget finished ones.
    /// A run that already fired ignores the signal and completes.
    fn cancel_pending(&mut self) {
        for run in &mut self.runs {
            if let Some(cancel) = run.cancel.take() {
                let _ = cancel.send(());
            }
        }
        self.runs.retain(|run| !run.handle.is_finished());
    }
}

struct SearchRun<S, V> {
    search: Arc<SiteSearch<S>>,
    view: Arc<V>,
    current: Arc<AtomicU64>,
    generation: u64,
    query: String,
}

impl<S: PageSource, V: ResultsView> SearchRun<S, V> {
    async fn execute(self) {
        let trimmed = self.query.trim();
        let results = if trimmed.is_empty() {
            Vec::new()
        } else {
            self.search.search_site(trimmed).await
        };

        if self.current.load(Ordering::SeqCst) != self.generation {
            debug!(query = trimmed, generation = self.generation, "discarding stale results");
            return;
        }
        if trimmed.is_empty() {
            self.view.clear();
        } else {
            self.view.show(trimmed, &results);
        }
    }
}
