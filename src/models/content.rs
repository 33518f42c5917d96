use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of generated HTML page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    App,
    Research,
}

impl ContentKind {
    pub const ALL: [ContentKind; 2] = [ContentKind::App, ContentKind::Research];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::App => "app",
            ContentKind::Research => "research",
        }
    }

    /// Directory the pages of this kind are stored in
    pub fn dir_name(&self) -> &'static str {
        match self {
            ContentKind::App => "apps",
            ContentKind::Research => "research",
        }
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "app" => Ok(ContentKind::App),
            "research" => Ok(ContentKind::Research),
            _ => Err(format!("Invalid content type: {}", s)),
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /api/v1/content/{kind}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRequest {
    pub content: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Result of saving a page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedContent {
    pub success: bool,
    pub id: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// One entry of the content listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub size: u64,
}

/// Response of `GET /api/v1/content/list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentListing {
    pub success: bool,
    pub items: Vec<ContentItem>,
    pub total: usize,
}
