/// Error types shared across the site search crates.
///
/// These errors represent failures in infrastructure components (HTTP fetching, body
/// decoding) that callers may want to degrade around. Application-specific errors should
/// be defined in each binary crate and wrap `CommonError` via `#[from]`.

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("{url} body exceeds {limit} bytes")]
    BodyTooLarge { url: String, limit: usize },

    #[error("{url} body is not valid UTF-8")]
    InvalidUtf8 { url: String },

    #[error("page not available: {0}")]
    Unavailable(String),
}
