use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Resolution variant of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageResolution {
    Small,
    #[default]
    Normal,
    High,
}

impl ImageResolution {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "small" => Self::Small,
            "high" => Self::High,
            _ => Self::Normal,
        }
    }
}

/// An image backed by exactly one file of the same name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub file_name: String,
    pub alpha: f32,
    pub resolution: ImageResolution,
}

impl Image {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            alpha: 1.0,
            resolution: ImageResolution::default(),
        }
    }
}

/// An audio track backed by exactly one file of the same name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audio {
    pub file_name: String,
    /// Duration in seconds, if known.
    pub playtime: Option<u32>,
    pub speaker: Option<String>,
}

impl Audio {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            playtime: None,
            speaker: None,
        }
    }
}

/// A printed page (PDF) of an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub file_name: String,
    pub title: Option<String>,
    pub pagina: Option<String>,
}

impl Page {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            title: None,
            pagina: None,
        }
    }
}

/// An article. Its HTML file shares the article's key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub file_name: String,
    pub issue_feed: String,
    pub issue_date: NaiveDate,
    pub title: Option<String>,
    /// Audio rendition of the article.
    pub audio: Option<String>,
    /// Image keys in display order.
    pub images: Vec<String>,
    /// Author portrait image keys.
    pub author_images: Vec<String>,
    /// Set when the reader bookmarked the article. Bookmarked articles are
    /// never scrubbed.
    pub bookmarked_time: Option<DateTime<Utc>>,
}

impl Article {
    pub fn new(file_name: impl Into<String>, issue_feed: impl Into<String>, issue_date: NaiveDate) -> Self {
        Self {
            file_name: file_name.into(),
            issue_feed: issue_feed.into(),
            issue_date,
            title: None,
            audio: None,
            images: Vec::new(),
            author_images: Vec::new(),
            bookmarked_time: None,
        }
    }

    pub const fn is_bookmarked(&self) -> bool {
        self.bookmarked_time.is_some()
    }
}

/// A section grouping articles. Its HTML file shares the section's key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub file_name: String,
    pub issue_feed: String,
    pub issue_date: NaiveDate,
    pub title: Option<String>,
    /// Podcast audio of the section.
    pub podcast: Option<String>,
    /// Article keys in display order.
    pub articles: Vec<String>,
    /// Image keys in display order.
    pub images: Vec<String>,
}

impl Section {
    pub fn new(file_name: impl Into<String>, issue_feed: impl Into<String>, issue_date: NaiveDate) -> Self {
        Self {
            file_name: file_name.into(),
            issue_feed: issue_feed.into(),
            issue_date,
            title: None,
            podcast: None,
            articles: Vec::new(),
            images: Vec::new(),
        }
    }
}
