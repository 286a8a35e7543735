use crate::ConfigError;
use serde::Deserialize;

/// Placeholder in `search-url` replaced by the encoded search query
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// Main configuration structure for Shelf-Crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Listing page the crawl starts from
    #[serde(rename = "seed-url", default)]
    pub seed_url: Option<String>,

    /// Search URL template containing `{query}`
    #[serde(rename = "search-url", default)]
    pub search_url: Option<String>,

    /// Maximum number of listing pages to process
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Delay before every detail page fetch (milliseconds)
    #[serde(rename = "request-delay", default = "default_request_delay")]
    pub request_delay: u64,

    /// Delay after every listing page (milliseconds)
    #[serde(rename = "page-delay", default = "default_page_delay")]
    pub page_delay: u64,

    /// What to do when a listing page cannot be fetched
    #[serde(rename = "listing-failure", default)]
    pub listing_failure: ListingFailurePolicy,
}

/// Reaction to a listing page fetch failure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingFailurePolicy {
    /// Stop the run; pagination cannot continue without the page
    #[default]
    Abort,

    /// Log it and move on to the next queued page
    Skip,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Full User-Agent header value
    #[serde(default = "default_user_agent")]
    pub name: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: default_user_agent(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the markdown report file
    #[serde(rename = "report-path")]
    pub report_path: String,

    /// Number of rows per analysis in the report
    #[serde(rename = "report-limit", default = "default_report_limit")]
    pub report_limit: u32,
}

fn default_max_pages() -> u32 {
    2
}

fn default_request_delay() -> u64 {
    1000
}

fn default_page_delay() -> u64 {
    1000
}

fn default_report_limit() -> u32 {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

impl CrawlerConfig {
    /// Resolves the URL the crawl starts from
    ///
    /// A query is substituted into `search-url` (form-encoded); without a
    /// query, `seed-url` is used.
    ///
    /// # Example
    ///
    /// ```
    /// use shelf_crawler::config::{CrawlerConfig, ListingFailurePolicy};
    ///
    /// let crawler = CrawlerConfig {
    ///     seed_url: None,
    ///     search_url: Some("https://shop.test/szukaj?q={query}".to_string()),
    ///     max_pages: 2,
    ///     request_delay: 500,
    ///     page_delay: 1000,
    ///     listing_failure: ListingFailurePolicy::Abort,
    /// };
    /// let seed = crawler.resolve_seed_url(Some("c sharp")).unwrap();
    /// assert_eq!(seed, "https://shop.test/szukaj?q=c+sharp");
    /// ```
    pub fn resolve_seed_url(&self, query: Option<&str>) -> Result<String, ConfigError> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());

        match (query, &self.search_url, &self.seed_url) {
            (Some(query), Some(template), _) => {
                let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
                Ok(template.replace(QUERY_PLACEHOLDER, &encoded))
            }
            (Some(_), None, _) => Err(ConfigError::Validation(
                "a search query needs search-url to be configured".to_string(),
            )),
            (None, _, Some(seed)) => Ok(seed.clone()),
            (None, _, None) => Err(ConfigError::Validation(
                "no seed-url configured and no search query given".to_string(),
            )),
        }
    }
}
