use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Access level of an issue variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Public,
    Demo,
    Regular,
}

impl IssueStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Demo => "demo",
            Self::Regular => "regular",
        }
    }
}

impl FromStr for IssueStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::Public),
            "demo" => Ok(Self::Demo),
            "regular" => Ok(Self::Regular),
            other => Err(format!("unknown issue status: {other}")),
        }
    }
}

/// Identity of an issue: feed, publication date and status.
///
/// Moments and front pages are keyed by the issue key of the issue they
/// belong to, so they stay in the store after the issue is gone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssueKey {
    pub feed: String,
    pub date: NaiveDate,
    pub status: IssueStatus,
}

impl IssueKey {
    pub fn new(feed: impl Into<String>, date: NaiveDate, status: IssueStatus) -> Self {
        Self {
            feed: feed.into(),
            date,
            status,
        }
    }
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.feed, self.date, self.status.as_str())
    }
}

/// The cover of an issue: images plus credits plus animation files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Moment {
    pub issue_key: IssueKey,
    pub images: Vec<String>,
    pub credits: Vec<String>,
    /// Plain file keys (animated covers).
    pub files: Vec<String>,
}

impl Moment {
    pub const fn new(issue_key: IssueKey) -> Self {
        Self {
            issue_key,
            images: Vec::new(),
            credits: Vec::new(),
            files: Vec::new(),
        }
    }
}

/// Front page join row: the page shown as cover of an issue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrontPage {
    pub issue_key: IssueKey,
    pub page: String,
}

/// A versioned bundle of shared resources (CSS, fonts, nav buttons).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInfo {
    pub version: i64,
    /// File keys belonging to this bundle.
    pub files: Vec<String>,
    pub date_download: Option<DateTime<Utc>>,
}

impl ResourceInfo {
    pub const fn new(version: i64) -> Self {
        Self {
            version,
            files: Vec::new(),
            date_download: None,
        }
    }

    pub const fn is_downloaded(&self) -> bool {
        self.date_download.is_some()
    }
}

/// A publication issue. Root of the content graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub key: IssueKey,
    /// Section keys in display order.
    pub sections: Vec<String>,
    /// Page keys in display order.
    pub pages: Vec<String>,
    /// Imprint article key.
    pub imprint: Option<String>,
}

impl Issue {
    pub const fn new(key: IssueKey) -> Self {
        Self {
            key,
            sections: Vec::new(),
            pages: Vec::new(),
            imprint: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_key_display() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let key = IssueKey::new("taz", date, IssueStatus::Regular);
        assert_eq!(key.to_string(), "taz/2024-03-01/regular");
    }

    #[test]
    fn test_issue_status_parse() {
        assert_eq!("demo".parse::<IssueStatus>(), Ok(IssueStatus::Demo));
        assert!("vip".parse::<IssueStatus>().is_err());
    }
}
