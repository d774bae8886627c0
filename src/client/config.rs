//! Client configuration.
use std::time::Duration;

use url::Url;

use crate::client::error::{ForumError, ForumResult};
use crate::client::sorting::SortCriterion;

const DEFAULT_BASE_URL: &str = "http://localhost:3000/";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Settings for talking to the forum API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Root of the API; `/discussions` is resolved against it.
    pub base_url: Url,
    /// Upper bound for one request. The UI itself offers no abort.
    pub request_timeout: Duration,
    /// Ordering applied when the page is first shown.
    pub default_sort: SortCriterion,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> ForumResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ForumError::Network(format!("invalid base url {base_url}: {e}")))?;
        Ok(Self {
            base_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            default_sort: SortCriterion::Newest,
        })
    }

    /// Reads `FORUM_API_URL`, `FORUM_REQUEST_TIMEOUT_SECONDS` and
    /// `FORUM_DEFAULT_SORT`, falling back to the defaults for unset values.
    pub fn from_env() -> ForumResult<Self> {
        let base_url =
            std::env::var("FORUM_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let mut config = Self::new(&base_url)?;

        if let Some(seconds) = std::env::var("FORUM_REQUEST_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|s| *s > 0)
        {
            config.request_timeout = Duration::from_secs(seconds);
        }

        if let Some(sort) = std::env::var("FORUM_DEFAULT_SORT")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.default_sort = sort;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_applies_defaults() {
        let config = ClientConfig::new(DEFAULT_BASE_URL).unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:3000/");
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.default_sort, SortCriterion::Newest);
    }

    #[test]
    fn rejects_unparseable_base_url() {
        assert!(matches!(
            ClientConfig::new("not a url"),
            Err(ForumError::Network(_))
        ));
    }
}
