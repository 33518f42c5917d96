use crate::config::ContentConfig;
use crate::error::{AppError, AppResult};
use crate::models::{ContentItem, ContentKind, ContentListing, ContentRequest, SavedContent};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

/// Default number of items returned by a listing
pub const DEFAULT_LIST_LIMIT: usize = 50;

const CONTENT_ID_LEN: usize = 8;

/// Stores generated HTML pages on disk
pub struct ContentService {
    base_dir: PathBuf,
    public_base_url: String,
}

/// Ids are the first 8 hex digits of a UUID; anything else never hits the disk
fn is_valid_content_id(id: &str) -> bool {
    id.len() == CONTENT_ID_LEN && id.bytes().all(|b| b.is_ascii_hexdigit())
}

impl ContentService {
    pub fn new(config: &ContentConfig) -> Self {
        Self {
            base_dir: PathBuf::from(&config.base_dir),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn dir(&self, kind: ContentKind) -> PathBuf {
        self.base_dir.join(kind.dir_name())
    }

    fn public_url(&self, kind: ContentKind, id: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, kind.as_str(), id)
    }

    /// Create the storage directories if missing
    pub async fn ensure_dirs(&self) -> AppResult<()> {
        for kind in ContentKind::ALL {
            fs::create_dir_all(self.dir(kind)).await?;
        }
        Ok(())
    }

    /// Save a page and its optional metadata
    pub async fn save(&self, kind: ContentKind, request: ContentRequest) -> AppResult<SavedContent> {
        let dir = self.dir(kind);
        fs::create_dir_all(&dir).await?;

        let id = Uuid::new_v4().simple().to_string()[..CONTENT_ID_LEN].to_string();
        fs::write(dir.join(format!("{}.html", id)), request.content.as_bytes()).await?;

        if let Some(metadata) = &request.metadata {
            let json = serde_json::to_vec(metadata)?;
            fs::write(dir.join(format!("{}.json", id)), json).await?;
        }

        info!(kind = %kind, id = %id, bytes = request.content.len(), "content saved");
        Ok(SavedContent {
            success: true,
            url: self.public_url(kind, &id),
            id,
            created_at: Utc::now(),
        })
    }

    /// HTML of a saved page
    pub async fn read(&self, kind: ContentKind, id: &str) -> AppResult<String> {
        let not_found = || {
            let label = match kind {
                ContentKind::App => "App",
                ContentKind::Research => "Research",
            };
            AppError::NotFound(format!("{} not found", label))
        };

        if !is_valid_content_id(id) {
            return Err(not_found());
        }

        match fs::read_to_string(self.dir(kind).join(format!("{}.html", id))).await {
            Ok(html) => Ok(html),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(not_found()),
            Err(e) => Err(e.into()),
        }
    }

    /// Most recent pages, newest first
    pub async fn list(&self, only: Option<ContentKind>, limit: usize) -> AppResult<ContentListing> {
        let mut items = Vec::new();
        for kind in ContentKind::ALL.into_iter().filter(|k| only.map_or(true, |want| want == *k)) {
            self.collect_items(kind, &self.dir(kind), &mut items).await?;
        }

        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = items.len();
        items.truncate(limit);

        Ok(ContentListing {
            success: true,
            items,
            total,
        })
    }

    async fn collect_items(&self, kind: ContentKind, dir: &Path, items: &mut Vec<ContentItem>) -> AppResult<()> {
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(dir = %dir.display(), "content directory missing");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(id) = file_name.to_str().and_then(|n| n.strip_suffix(".html")) else {
                continue;
            };

            let metadata = entry.metadata().await?;
            let created_at: DateTime<Utc> = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            items.push(ContentItem {
                id: id.to_string(),
                kind,
                url: self.public_url(kind, id),
                created_at,
                size: metadata.len(),
            });
        }
        Ok(())
    }
}
