/// Crawl phase definitions for one category run
///
/// A run moves `ResolvingPagination → FetchingPage(n) → EnrichingPage(n) →
/// EvaluatingPage(n)` and then either loops to the next page or lands in one of
/// the terminal phases.
use std::fmt;

/// Represents where a category run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    // ===== Active Phases =====
    /// Fetching page 1 and reading its pagination markup
    ResolvingPagination,

    /// Fetching and parsing list page `n`
    FetchingPage(u32),

    /// Filling in detail content and regions for the rows of page `n`
    EnrichingPage(u32),

    /// Comparing the rows of page `n` against the stored last-crawled link
    EvaluatingPage(u32),

    // ===== Terminal Phases =====
    /// The last-crawled link was found on page `n`
    Stopped(u32),

    /// All `n` pages were crawled without meeting the last-crawled link
    Exhausted(u32),

    /// Fetching list page `n` failed; earlier pages are kept
    Aborted(u32),
}

/// How a run ended, without the page number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    Stopped,
    Exhausted,
    Aborted,
}

impl CrawlPhase {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped(_) | Self::Exhausted(_) | Self::Aborted(_))
    }

    /// Page the phase refers to (`ResolvingPagination` works on page 1)
    pub fn page(&self) -> u32 {
        match self {
            Self::ResolvingPagination => 1,
            Self::FetchingPage(n)
            | Self::EnrichingPage(n)
            | Self::EvaluatingPage(n)
            | Self::Stopped(n)
            | Self::Exhausted(n)
            | Self::Aborted(n) => *n,
        }
    }

    /// Returns the termination kind for terminal phases
    pub fn termination(&self) -> Option<Termination> {
        match self {
            Self::Stopped(_) => Some(Termination::Stopped),
            Self::Exhausted(_) => Some(Termination::Exhausted),
            Self::Aborted(_) => Some(Termination::Aborted),
            _ => None,
        }
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: &CrawlPhase) -> bool {
        match (*self, *next) {
            (Self::ResolvingPagination, Self::FetchingPage(1)) => true,
            (Self::ResolvingPagination, Self::Aborted(1)) => true,
            (Self::FetchingPage(n), Self::EnrichingPage(m)) => n == m,
            (Self::FetchingPage(n), Self::Aborted(m)) => n == m,
            (Self::EnrichingPage(n), Self::EvaluatingPage(m)) => n == m,
            (Self::EvaluatingPage(n), Self::FetchingPage(m)) => m == n + 1,
            (Self::EvaluatingPage(n), Self::Stopped(m)) => n == m,
            (Self::EvaluatingPage(n), Self::Exhausted(m)) => n == m,
            _ => false,
        }
    }

    /// Converts the phase to a short string for logs and the run table
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::ResolvingPagination => "resolving_pagination",
            Self::FetchingPage(_) => "fetching_page",
            Self::EnrichingPage(_) => "enriching_page",
            Self::EvaluatingPage(_) => "evaluating_page",
            Self::Stopped(_) => "stopped",
            Self::Exhausted(_) => "exhausted",
            Self::Aborted(_) => "aborted",
        }
    }
}

impl Termination {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Exhausted => "exhausted",
            Self::Aborted => "aborted",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "stopped" => Some(Self::Stopped),
            "exhausted" => Some(Self::Exhausted),
            "aborted" => Some(Self::Aborted),
            _ => None,
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResolvingPagination => write!(f, "{}", self.to_db_string()),
            other => write!(f, "{}({})", other.to_db_string(), other.page()),
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
