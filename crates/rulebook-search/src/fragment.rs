/// Transient "search hit" highlighting of page elements.
///
/// Used when a page is opened with a `#fragment` (hold 2500 ms) and by the in-page section
/// jump (hold 1500 ms). A flash moves Idle → Highlighted → Idle; starting a new flash while
/// one is showing ends the previous one first.
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use site_common::document::{Document, NodeId};
use tracing::{debug, info};

/// CSS class marking the element being flashed.
pub const HIT_CLASS: &str = "search-hit";

pub const FRAGMENT_HOLD: Duration = Duration::from_millis(2500);
pub const JUMP_HOLD: Duration = Duration::from_millis(1500);

/// The live page a flash is shown on.
pub trait PageView: Send + Sync {
    fn resolve_id(&self, element_id: &str) -> Option<NodeId>;
    fn add_class(&self, node: NodeId, class: &str);
    fn remove_class(&self, node: NodeId, class: &str);
    fn scroll_into_view(&self, node: NodeId);
}

/// A loaded page held in memory. Scrolling is recorded rather than performed.
pub struct DocumentView {
    doc: Mutex<Document>,
    scrolled_to: Mutex<Option<NodeId>>,
}

impl DocumentView {
    pub fn new(doc: Document) -> Self {
        Self {
            doc: Mutex::new(doc),
            scrolled_to: Mutex::new(None),
        }
    }

    /// Run `f` against the current state of the page.
    pub fn with_document<T>(&self, f: impl FnOnce(&Document) -> T) -> T {
        f(&lock(&self.doc))
    }

    #[cfg(test)]
    pub fn scrolled_to(&self) -> Option<NodeId> {
        *lock(&self.scrolled_to)
    }
}

impl PageView for DocumentView {
    fn resolve_id(&self, element_id: &str) -> Option<NodeId> {
        lock(&self.doc).element_by_id(element_id)
    }

    fn add_class(&self, node: NodeId, class: &str) {
        lock(&self.doc).add_class(node, class);
    }

    fn remove_class(&self, node: NodeId, class: &str) {
        lock(&self.doc).remove_class(node, class);
    }

    fn scroll_into_view(&self, node: NodeId) {
        debug!(node, "scrolling into view");
        *lock(&self.scrolled_to) = Some(node);
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashState {
    Idle,
    Highlighted(NodeId),
}

pub struct Flasher<V> {
    view: Arc<V>,
    state: Mutex<FlashState>,
}

impl<V: PageView> Flasher<V> {
    pub fn new(view: Arc<V>) -> Self {
        Self {
            view,
            state: Mutex::new(FlashState::Idle),
        }
    }

    pub fn view(&self) -> &Arc<V> {
        &self.view
    }

    pub fn state(&self) -> FlashState {
        *lock(&self.state)
    }

    /// Add the hit class to `node` and scroll to it.
    pub fn begin(&self, node: NodeId) {
        let mut state = lock(&self.state);
        if let FlashState::Highlighted(previous) = *state {
            self.view.remove_class(previous, HIT_CLASS);
        }
        self.view.add_class(node, HIT_CLASS);
        self.view.scroll_into_view(node);
        *state = FlashState::Highlighted(node);
    }

    /// Remove the hit class from `node` if it is still the one being flashed.
    pub fn end(&self, node: NodeId) {
        let mut state = lock(&self.state);
        if *state == FlashState::Highlighted(node) {
            self.view.remove_class(node, HIT_CLASS);
            *state = FlashState::Idle;
        }
    }

    /// Highlight `node` for `hold`, then return to idle.
    pub async fn flash(&self, node: NodeId, hold: Duration) {
        self.begin(node);
        tokio::time::sleep(hold).await;
        self.end(node);
    }
}

/// The fragment part of a URL, without the `#`. `None` when absent or empty.
pub fn fragment_of(url: &str) -> Option<&str> {
    url.split_once('#')
        .map(|(_, fragment)| fragment)
        .filter(|fragment| !fragment.is_empty())
}

/// Flash the element named by the URL fragment, if there is one and it exists.
/// Returns whether a flash happened.
pub async fn highlight_from_fragment<V: PageView>(flasher: &Flasher<V>, url: &str, hold: Duration) -> bool {
    let Some(fragment) = fragment_of(url) else {
        return false;
    };
    let Some(node) = flasher.view().resolve_id(fragment) else {
        debug!(fragment, "fragment does not name an element");
        return false;
    };
    info!(fragment, "highlighting section from url fragment");
    flasher.flash(node, hold).await;
    true
}
