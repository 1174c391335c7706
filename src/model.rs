//! Harvested post and the category classification attached to it on storage

use serde::Serialize;

/// One row of a board, enriched with its detail-page body and region tag
///
/// `link` is the identity of a post within its category. `ordinal_id` is the
/// number the board displays next to the row and is kept only for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub ordinal_id: i64,
    pub title: String,
    pub link: String,
    pub department: String,
    pub published_date: String,
    pub views: u64,
    pub has_attachment: bool,
    pub content: String,
    pub region: Option<String>,
}

impl Post {
    /// Creates a post with only the list-row identity filled in
    pub fn new(title: &str, link: &str) -> Self {
        Self {
            ordinal_id: 0,
            title: title.to_string(),
            link: link.to_string(),
            department: String::new(),
            published_date: String::new(),
            views: 0,
            has_attachment: false,
            content: String::new(),
            region: None,
        }
    }
}

/// Top-level grouping a category is filed under when stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostCategory {
    PublicInstitution,
    Welfare,
    Culture,
    News,
}

impl PostCategory {
    /// Maps a board category name to its group
    pub fn from_category_name(name: &str) -> Self {
        match name {
            "고시/공고" | "공지사항" | "보도자료" => Self::PublicInstitution,
            "문화소식" => Self::Culture,
            _ if name.starts_with("복지정보") => Self::Welfare,
            _ => Self::News,
        }
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::PublicInstitution => "PUBLIC_INSTITUTION",
            Self::Welfare => "WELFARE",
            Self::Culture => "CULTURE",
            Self::News => "NEWS",
        }
    }
}

/// Audience of a welfare board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WelfareCategory {
    Senior,
    Disabled,
    WomenFamily,
    Child,
    Youth,
}

impl WelfareCategory {
    /// Derives the audience from a category name such as `복지정보-어르신`
    pub fn from_category_name(name: &str) -> Option<Self> {
        if name.contains("어르신") {
            Some(Self::Senior)
        } else if name.contains("장애인") {
            Some(Self::Disabled)
        } else if name.contains("여성가족") {
            Some(Self::WomenFamily)
        } else if name.contains("아동청소년") {
            Some(Self::Child)
        } else if name.contains("청년") {
            Some(Self::Youth)
        } else {
            None
        }
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Senior => "SENIOR",
            Self::Disabled => "DISABLED",
            Self::WomenFamily => "WOMEN_FAMILY",
            Self::Child => "CHILD",
            Self::Youth => "YOUTH",
        }
    }
}
