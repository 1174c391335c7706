use crate::config::types::{BoardEntry, Config, CrawlerConfig, OutputConfig, TransportConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_transport_config(&config.transport)?;
    validate_output_config(&config.output)?;
    validate_boards(&config.boards)?;
    validate_regions(&config.regions.names)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.detail_concurrency < 1 || config.detail_concurrency > 32 {
        return Err(ConfigError::Validation(format!(
            "detail_concurrency must be between 1 and 32, got {}",
            config.detail_concurrency
        )));
    }

    if config.detail_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "detail_timeout_ms must be >= 100ms, got {}ms",
            config.detail_timeout_ms
        )));
    }

    if config.max_concurrent_boards < 1 || config.max_concurrent_boards > 16 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_boards must be between 1 and 16, got {}",
            config.max_concurrent_boards
        )));
    }

    Ok(())
}

/// Validates transport configuration
fn validate_transport_config(config: &TransportConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.request_timeout_ms < 100 || config.connect_timeout_ms < 100 {
        return Err(ConfigError::Validation(
            "request and connect timeouts must be >= 100ms".to_string(),
        ));
    }

    if config.base_backoff_ms > config.max_backoff_ms {
        return Err(ConfigError::Validation(format!(
            "base_backoff_ms ({}) cannot exceed max_backoff_ms ({})",
            config.base_backoff_ms, config.max_backoff_ms
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if matches!(config.report_path.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "report_path cannot be empty when set".to_string(),
        ));
    }

    if matches!(config.summary_path.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates board entries
fn validate_boards(boards: &[BoardEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for board in boards {
        if board.category_name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "category_name cannot be empty".to_string(),
            ));
        }

        if !seen.insert(board.category_name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate board category '{}'",
                board.category_name
            )));
        }

        if board.pages_to_crawl == Some(0) {
            return Err(ConfigError::Validation(format!(
                "Board '{}' must crawl at least one page",
                board.category_name
            )));
        }

        validate_list_url_prefix(&board.category_name, &board.list_url_prefix)?;
    }

    Ok(())
}

/// The prefix must become a fetchable http(s) URL once a page number is appended
fn validate_list_url_prefix(category: &str, prefix: &str) -> Result<(), ConfigError> {
    let first_page = format!("{}1", prefix);
    let url = Url::parse(&first_page).map_err(|e| {
        ConfigError::InvalidUrl(format!(
            "Invalid list-url-prefix for '{}': {}",
            category, e
        ))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "list-url-prefix for '{}' must use http or https, got '{}'",
            category,
            url.scheme()
        )));
    }

    Ok(())
}

fn validate_regions(names: &[String]) -> Result<(), ConfigError> {
    if names.iter().any(|n| n.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "region names cannot be empty".to_string(),
        ));
    }
    Ok(())
}
