use std::time::Duration;

use crate::error::AppError;

/// How rendered results are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Html,
    Json,
}

impl OutputFormat {
    fn parse(raw: &str) -> Result<Self, AppError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "json" => Ok(Self::Json),
            other => Err(AppError::Config(format!(
                "RULEBOOK_OUTPUT must be \"html\" or \"json\", got \"{other}\""
            ))),
        }
    }
}

/// Application configuration loaded explicitly from environment variables.
///
/// The page list and priority table are compiled in (see `pages`); only deployment
/// details come from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL the configured page URLs are resolved against.
    pub base_url: String,
    /// Page loaded at startup for fragment highlighting and section jumps, e.g. "skills.html#might".
    pub landing_url: String,
    /// Quiet period after the last input event before a search runs.
    pub debounce: Duration,
    pub output: OutputFormat,
}

impl Config {
    /// Required:
    /// - `RULEBOOK_BASE_URL`: where the rulebook pages are served from
    ///
    /// Optional:
    /// - `RULEBOOK_LANDING_URL`: landing page, may carry a `#fragment` (default "index.html")
    /// - `RULEBOOK_DEBOUNCE_MS`: input debounce window (default 250)
    /// - `RULEBOOK_OUTPUT`: "html" or "json" (default "html")
    pub fn from_env() -> Result<Self, AppError> {
        let base_url = std::env::var("RULEBOOK_BASE_URL").map_err(|_| {
            AppError::Config("RULEBOOK_BASE_URL environment variable is required".to_string())
        })?;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "RULEBOOK_BASE_URL must be an http(s) URL, got {base_url}"
            )));
        }

        let landing_url =
            std::env::var("RULEBOOK_LANDING_URL").unwrap_or_else(|_| "index.html".to_string());

        let debounce = std::env::var("RULEBOOK_DEBOUNCE_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or_else(|| Duration::from_millis(250));

        let output = match std::env::var("RULEBOOK_OUTPUT") {
            Ok(raw) => OutputFormat::parse(&raw)?,
            Err(_) => OutputFormat::Html,
        };

        Ok(Self {
            base_url,
            landing_url,
            debounce,
            output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_parsing() {
        assert_eq!(OutputFormat::parse("HTML").ok(), Some(OutputFormat::Html));
        assert_eq!(OutputFormat::parse(" json ").ok(), Some(OutputFormat::Json));
        assert!(OutputFormat::parse("xml").is_err());
    }
}
