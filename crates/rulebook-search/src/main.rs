mod config;
mod error;
mod fetcher;
mod fragment;
mod highlight;
mod input;
mod jump;
mod model;
mod pages;
mod render;
mod search;
mod snippet;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use error::AppError;
use fragment::{DocumentView, Flasher};
use input::SearchInput;
use pages::{PagePriority, PAGES};
use render::{ResultsView, StdoutView};
use search::SiteSearch;
use site_common::http::{SiteClient, SiteClientConfig};

/// One line of stdin, read as an event on the search box.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    /// The box now holds this text (debounced search).
    Input(&'a str),
    /// `?text`: submit right away.
    Submit(&'a str),
    /// `!clear`
    Clear,
    /// `@text`: jump to a section of the landing page.
    Jump(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        if line.trim() == "!clear" {
            Self::Clear
        } else if let Some(rest) = line.strip_prefix('?') {
            Self::Submit(rest)
        } else if let Some(rest) = line.strip_prefix('@') {
            Self::Jump(rest)
        } else {
            Self::Input(line)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries rendered results only
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting rulebook-search");

    // 1. Load config from environment
    let config = Config::from_env()?;
    info!(
        base_url = %config.base_url,
        landing_url = %config.landing_url,
        debounce_ms = config.debounce.as_millis(),
        output = ?config.output,
        "configuration loaded"
    );

    let client = build_client(&config)?;
    let view = Arc::new(StdoutView::new(config.output));

    // 2. Load the landing page (optional: without it, fragment flash and jumps are disabled)
    let landing_page = config.landing_url.split('#').next().unwrap_or_default();
    let flasher = match fetcher::fetch_document(&client, landing_page).await {
        Some(doc) => Some(Arc::new(Flasher::new(Arc::new(DocumentView::new(doc))))),
        None => {
            warn!(landing_page, "landing page unavailable, section highlighting disabled");
            None
        }
    };

    if let Some(flasher) = &flasher {
        let flasher = Arc::clone(flasher);
        let url = config.landing_url.clone();
        tokio::spawn(async move {
            fragment::highlight_from_fragment(&flasher, &url, fragment::FRAGMENT_HOLD).await;
        });
    }

    // 3. Wire the search box
    let search = Arc::new(SiteSearch::new(client, PAGES, PagePriority::default()));
    let mut input = SearchInput::new(search, Arc::clone(&view), config.debounce);

    info!(pages = PAGES.len(), "ready, reading queries from stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Input(value) => input.on_input(value),
            Command::Submit(value) => input.on_submit(value),
            Command::Clear => input.on_clear(),
            Command::Jump(query) => jump_to_section(flasher.as_ref(), view.as_ref(), query),
        }
    }

    input.settle().await;
    info!("input closed, shutting down");
    Ok(())
}

fn build_client(config: &Config) -> Result<SiteClient, AppError> {
    Ok(SiteClient::new(SiteClientConfig::from_env(&config.base_url))?)
}

fn jump_to_section(flasher: Option<&Arc<Flasher<DocumentView>>>, view: &StdoutView, query: &str) {
    let Some(flasher) = flasher else {
        view.notice("Section jump is unavailable: the landing page could not be loaded.");
        return;
    };
    if query.trim().is_empty() {
        return;
    }

    let target = flasher
        .view()
        .with_document(|doc| jump::find_jump_target(doc, query));
    let Some(node) = target else {
        info!(query, "no matching section");
        view.notice(&format!("No matching section found for \"{query}\"."));
        return;
    };

    debug!(node, state = ?flasher.state(), "jumping to section");
    let flasher = Arc::clone(flasher);
    tokio::spawn(async move {
        flasher.flash(node, fragment::JUMP_HOLD).await;
    });
}
