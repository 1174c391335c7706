//! Region tagging by lexical match against a known list of place names

use crate::config::RegionConfig;

/// Sub-areas (읍/면/동) of Seosan
///
/// A name that contains another listed name must come before it.
pub const DEFAULT_REGIONS: &[&str] = &[
    "대산읍", "인지면", "부석면", "팔봉면", "지곡면", "성연면", "음암면", "운산면", "해미면",
    "고북면", "부춘동", "동문1동", "동문2동", "수석동", "석남동",
];

/// Tags posts with the first listed region their text mentions
#[derive(Debug, Clone)]
pub struct RegionTagger {
    regions: Vec<String>,
}

impl Default for RegionTagger {
    fn default() -> Self {
        Self::new(DEFAULT_REGIONS.iter().map(|r| r.to_string()).collect())
    }
}

impl RegionTagger {
    pub fn new(regions: Vec<String>) -> Self {
        Self { regions }
    }

    /// Uses the configured list, or the built-in one when it is empty
    pub fn from_config(config: &RegionConfig) -> Self {
        if config.names.is_empty() {
            Self::default()
        } else {
            Self::new(config.names.clone())
        }
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    /// Returns the first region, in list order, found in `title + " " + content`
    ///
    /// # Example
    ///
    /// ```
    /// use bulletin_harvest::crawler::RegionTagger;
    ///
    /// let tagger = RegionTagger::default();
    /// assert_eq!(tagger.tag("해미면 공지사항", ""), Some("해미면"));
    /// assert_eq!(tagger.tag("시정 소식", ""), None);
    /// ```
    pub fn tag(&self, title: &str, content: &str) -> Option<&str> {
        let haystack = format!("{} {}", title, content);
        self.regions
            .iter()
            .find(|region| haystack.contains(region.as_str()))
            .map(String::as_str)
    }
}
