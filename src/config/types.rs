use serde::Deserialize;

/// Main configuration structure for Bulletin-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub regions: RegionConfig,
    #[serde(default, rename = "board")]
    pub boards: Vec<BoardEntry>,
}

impl Config {
    /// Resolves every configured board into the form the orchestrator consumes
    pub fn board_configs(&self) -> Vec<BoardConfig> {
        self.boards
            .iter()
            .map(|entry| entry.resolve(self.crawler.max_pages))
            .collect()
    }

    /// Returns the names of all configured categories, in file order
    pub fn category_names(&self) -> Vec<String> {
        self.boards.iter().map(|b| b.category_name.clone()).collect()
    }
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Page cap applied to boards that do not set their own
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Number of detail pages fetched in parallel for one list page
    #[serde(rename = "detail-concurrency", default = "default_detail_concurrency")]
    pub detail_concurrency: u32,

    /// Per detail-page deadline (milliseconds), retries included
    #[serde(rename = "detail-timeout-ms", default = "default_detail_timeout_ms")]
    pub detail_timeout_ms: u64,

    /// Number of boards the batch driver crawls at the same time
    #[serde(rename = "max-concurrent-boards", default = "default_max_concurrent_boards")]
    pub max_concurrent_boards: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            detail_concurrency: default_detail_concurrency(),
            detail_timeout_ms: default_detail_timeout_ms(),
            max_concurrent_boards: default_max_concurrent_boards(),
        }
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    #[serde(rename = "accept-language", default = "default_accept_language")]
    pub accept_language: String,

    #[serde(rename = "request-timeout-ms", default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(rename = "connect-timeout-ms", default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Total attempts per fetch, the first one included
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(rename = "base-backoff-ms", default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,

    #[serde(rename = "max-backoff-ms", default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            request_timeout_ms: default_request_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the JSON report of the newly harvested posts
    #[serde(rename = "report-path", default)]
    pub report_path: Option<String>,

    /// Path to the markdown summary file
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,
}

/// Known region names used for tagging
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegionConfig {
    /// Ordered list; an empty list selects the built-in one
    #[serde(default)]
    pub names: Vec<String>,
}

/// Row layout family of a board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardKind {
    /// number, title, department, date
    Standard,
    /// number, title, attachment icon, views, date
    Welfare,
}

impl BoardKind {
    /// Infers the kind from a category name (the welfare family is `복지정보-*`)
    pub fn infer(category_name: &str) -> Self {
        if category_name.starts_with("복지정보") {
            Self::Welfare
        } else {
            Self::Standard
        }
    }

    /// Index of the row cell holding the attachment icon, if this kind has one
    pub fn attachment_column(&self) -> Option<usize> {
        match self {
            Self::Standard => None,
            Self::Welfare => Some(2),
        }
    }
}

/// One `[[board]]` entry as written in the config file
#[derive(Debug, Clone, Deserialize)]
pub struct BoardEntry {
    #[serde(rename = "category-name")]
    pub category_name: String,

    /// Prefix to which a 1-based page number is appended
    #[serde(rename = "list-url-prefix")]
    pub list_url_prefix: String,

    #[serde(rename = "pages-to-crawl", default)]
    pub pages_to_crawl: Option<u32>,

    #[serde(default)]
    pub kind: Option<BoardKind>,
}

impl BoardEntry {
    fn resolve(&self, default_pages: u32) -> BoardConfig {
        BoardConfig {
            category_name: self.category_name.clone(),
            list_page_url_prefix: self.list_url_prefix.clone(),
            pages_to_crawl_limit: self.pages_to_crawl.unwrap_or(default_pages),
            kind: self
                .kind
                .unwrap_or_else(|| BoardKind::infer(&self.category_name)),
        }
    }
}

/// A board as seen by the orchestrator; immutable for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    pub category_name: String,
    pub list_page_url_prefix: String,
    pub pages_to_crawl_limit: u32,
    pub kind: BoardKind,
}

impl BoardConfig {
    pub fn new(category_name: &str, list_page_url_prefix: &str, pages_to_crawl_limit: u32) -> Self {
        Self {
            category_name: category_name.to_string(),
            list_page_url_prefix: list_page_url_prefix.to_string(),
            pages_to_crawl_limit,
            kind: BoardKind::infer(category_name),
        }
    }

    pub fn with_kind(mut self, kind: BoardKind) -> Self {
        self.kind = kind;
        self
    }
}

fn default_max_pages() -> u32 {
    10
}

fn default_detail_concurrency() -> u32 {
    5
}

fn default_detail_timeout_ms() -> u64 {
    20_000
}

fn default_max_concurrent_boards() -> u32 {
    1
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36".to_string()
}

fn default_accept_language() -> String {
    "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7".to_string()
}

fn default_request_timeout_ms() -> u64 {
    20_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    8_000
}
