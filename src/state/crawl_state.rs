use chrono::{DateTime, Utc};

/// Persisted high-water mark of one category
///
/// `last_crawled_link` is the link of the newest post harvested by the most
/// recent run that found anything new. The orchestrator stops at this link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlState {
    pub category_name: String,
    pub last_crawled_link: Option<String>,
    pub last_crawled_at: DateTime<Utc>,
}

impl CrawlState {
    /// Creates a state pointing at `link`, stamped with `at`
    pub fn new(category_name: &str, link: &str, at: DateTime<Utc>) -> Self {
        Self {
            category_name: category_name.to_string(),
            last_crawled_link: Some(link.to_string()),
            last_crawled_at: at,
        }
    }

    /// Returns true if `link` is the stored stop marker
    pub fn is_marker(&self, link: &str) -> bool {
        self.last_crawled_link.as_deref() == Some(link)
    }

    /// Time elapsed since the mark was last advanced
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.last_crawled_at
    }
}
