use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;

use super::storage::{LocatorError, StorageLocator};

/// Coarse aspect classification used only as a storage-key namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
    Other,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
            Orientation::Other => "other",
        }
    }
}

impl Display for Orientation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// A video row as persisted by the record store.
///
/// `video_url` holds the encoded [`StorageLocator`] (`"bucket,key"`), never a playable URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct VideoRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoRecord {
    pub fn new(user_id: Uuid, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            description: None,
            thumbnail_url: None,
            video_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Decoded video locator, if one has been recorded.
    pub fn video_locator(&self) -> Option<Result<StorageLocator, LocatorError>> {
        self.video_url.as_deref().map(StorageLocator::decode)
    }

    pub fn set_video_locator(&mut self, locator: &StorageLocator) {
        self.video_url = Some(locator.encode());
        self.updated_at = Utc::now();
    }
}

/// Video as returned to clients: `video_url` is a freshly signed playback URL.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VideoResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoResponse {
    pub fn new(record: VideoRecord, signed_video_url: Option<String>) -> Self {
        VideoResponse {
            id: record.id,
            user_id: record.user_id,
            title: record.title,
            description: record.description,
            thumbnail_url: record.thumbnail_url,
            video_url: signed_video_url,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
