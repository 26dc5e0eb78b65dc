//! Configuration management for the product search client.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result};

/// Backend used when `PRODUCT_SEARCH_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:5001";

/// Page size the dashboard requests by default.
pub const DEFAULT_PER_PAGE: u32 = 50;

/// Bounds the backend clamps `per_page` to.
pub const MIN_PER_PAGE: u32 = 10;
pub const MAX_PER_PAGE: u32 = 100;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the search/chat API, without a trailing slash
    pub api_base_url: String,
    /// Products requested per page
    pub per_page: u32,
    /// Number of history entries sent with each chat request
    pub chat_history_window: usize,
    /// Delay before first-open suggestions are shown
    pub suggestion_delay: Duration,
    /// Consecutive malformed stream frames tolerated before failing (None = unbounded)
    pub max_bad_frames: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            per_page: DEFAULT_PER_PAGE,
            chat_history_window: 6,
            suggestion_delay: Duration::from_millis(1000),
            max_bad_frames: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let api_base_url = env::var("PRODUCT_SEARCH_API_URL")
            .unwrap_or(defaults.api_base_url)
            .trim_end_matches('/')
            .to_string();

        let config = Self {
            api_base_url,
            per_page: parse_var("PRODUCT_SEARCH_PER_PAGE")?.unwrap_or(defaults.per_page),
            chat_history_window: parse_var("PRODUCT_SEARCH_CHAT_HISTORY")?
                .unwrap_or(defaults.chat_history_window),
            suggestion_delay: parse_var("PRODUCT_SEARCH_SUGGESTION_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.suggestion_delay),
            max_bad_frames: parse_var("PRODUCT_SEARCH_MAX_BAD_FRAMES")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that the backend would otherwise silently clamp.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_PER_PAGE..=MAX_PER_PAGE).contains(&self.per_page) {
            return Err(Error::Config(format!(
                "PRODUCT_SEARCH_PER_PAGE must be between {} and {}, got {}",
                MIN_PER_PAGE, MAX_PER_PAGE, self.per_page
            )));
        }
        if self.api_base_url.is_empty() {
            return Err(Error::Config("PRODUCT_SEARCH_API_URL is empty".to_string()));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{} has an invalid value: {:?}", name, raw))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.per_page, 50);
        assert_eq!(config.chat_history_window, 6);
        assert!(config.max_bad_frames.is_none());
    }

    #[test]
    fn test_per_page_out_of_range() {
        let config = Config {
            per_page: 500,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
