use std::future::Future;
use std::time::Duration;

use futures::StreamExt;
use tracing::debug;

use crate::error::CommonError;

/// Anything that can hand back the raw markup for a page URL.
///
/// The search pipeline only ever talks to this trait, so tests can swap the network for
/// an in-memory page map.
pub trait PageSource: Send + Sync {
    fn fetch_html(&self, url: &str) -> impl Future<Output = Result<String, CommonError>> + Send;
}

#[derive(Clone, Debug)]
pub struct SiteClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub max_body_bytes: usize,
}

impl SiteClientConfig {
    /// Optional:
    /// - `SITE_TIMEOUT_SECS`: per-request timeout (default 15)
    /// - `SITE_MAX_BODY_BYTES`: largest page body accepted (default 2 MiB)
    pub fn from_env(base_url: &str) -> Self {
        let timeout = std::env::var("SITE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(15));

        let max_body_bytes = std::env::var("SITE_MAX_BODY_BYTES")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(2 * 1024 * 1024);

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            max_body_bytes,
        }
    }

    /// Resolve a page URL against the base. Absolute URLs pass through untouched.
    pub fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        format!("{}/{}", self.base_url, url.trim_start_matches('/'))
    }
}

/// reqwest-backed page fetcher. One GET per call, no retries.
#[derive(Clone)]
pub struct SiteClient {
    config: SiteClientConfig,
    http: reqwest::Client,
}

impl SiteClient {
    pub fn new(config: SiteClientConfig) -> Result<Self, CommonError> {
        let http = reqwest::Client::builder()
            .user_agent("rulebook-search")
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &SiteClientConfig {
        &self.config
    }

    async fn get_text(&self, url: &str) -> Result<String, CommonError> {
        let full = self.config.resolve(url);
        debug!(url = %full, "fetching page");

        let resp = self
            .http
            .get(&full)
            .header(reqwest::header::ACCEPT, "text/html")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CommonError::Status { url: full, status });
        }

        read_limited_body(resp, &full, self.config.max_body_bytes).await
    }
}

impl PageSource for SiteClient {
    fn fetch_html(&self, url: &str) -> impl Future<Output = Result<String, CommonError>> + Send {
        self.get_text(url)
    }
}

async fn read_limited_body(
    resp: reqwest::Response,
    url: &str,
    max_bytes: usize,
) -> Result<String, CommonError> {
    let mut body: Vec<u8> = Vec::new();
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if body.len() + chunk.len() > max_bytes {
            return Err(CommonError::BodyTooLarge {
                url: url.to_string(),
                limit: max_bytes,
            });
        }
        body.extend_from_slice(&chunk);
    }
    String::from_utf8(body).map_err(|_| CommonError::InvalidUtf8 {
        url: url.to_string(),
    })
}
