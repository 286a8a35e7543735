use crate::config::types::{
    Config, CrawlerConfig, OutputConfig, UserAgentConfig, QUERY_PLACEHOLDER,
};
use crate::ConfigError;
use url::Url;

/// Upper bound on the listing page budget
const MAX_PAGES_LIMIT: u32 = 500;

/// Upper bound on either delay (milliseconds)
const MAX_DELAY_MS: u64 = 60_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.seed_url.is_none() && config.search_url.is_none() {
        return Err(ConfigError::Validation(
            "either seed-url or search-url must be set".to_string(),
        ));
    }

    if let Some(seed) = &config.seed_url {
        validate_http_url(seed, "seed-url")?;
    }

    if let Some(template) = &config.search_url {
        if !template.contains(QUERY_PLACEHOLDER) {
            return Err(ConfigError::Validation(format!(
                "search-url must contain {}, got '{}'",
                QUERY_PLACEHOLDER, template
            )));
        }
        validate_http_url(&template.replace(QUERY_PLACEHOLDER, "q"), "search-url")?;
    }

    if config.max_pages < 1 || config.max_pages > MAX_PAGES_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max-pages must be between 1 and {}, got {}",
            MAX_PAGES_LIMIT, config.max_pages
        )));
    }

    if config.request_delay > MAX_DELAY_MS {
        return Err(ConfigError::Validation(format!(
            "request-delay must be <= {}ms, got {}ms",
            MAX_DELAY_MS, config.request_delay
        )));
    }

    if config.page_delay > MAX_DELAY_MS {
        return Err(ConfigError::Validation(format!(
            "page-delay must be <= {}ms, got {}ms",
            MAX_DELAY_MS, config.page_delay
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent name cannot be empty".to_string(),
        ));
    }

    if config.name.chars().any(|c| c.is_control()) {
        return Err(ConfigError::Validation(
            "user-agent name cannot contain control characters".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    if config.report_path.is_empty() {
        return Err(ConfigError::Validation(
            "report-path cannot be empty".to_string(),
        ));
    }

    if config.report_limit < 1 {
        return Err(ConfigError::Validation(format!(
            "report-limit must be >= 1, got {}",
            config.report_limit
        )));
    }

    Ok(())
}

/// Validates that a URL parses and uses HTTP or HTTPS
fn validate_http_url(raw: &str, field: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use HTTP or HTTPS",
            field, raw
        )));
    }

    Ok(())
}
