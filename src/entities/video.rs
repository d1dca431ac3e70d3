use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Uuid,
    pub youtube_id: String,
    pub title: String,
    pub description: Option<String>,
    pub channel_name: String,
    pub duration_seconds: Option<i32>,
    pub thumbnail_url: String,
    pub language: String,
    pub category_id: Option<Uuid>,
    pub submitted_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub view_count: i32,
    pub is_featured: bool,
}

/// The slice of a video joined onto playlist entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub id: Uuid,
    pub title: String,
    pub youtube_id: String,
    pub thumbnail_url: String,
    pub channel_name: String,
    pub duration_seconds: Option<i32>,
}

impl From<&Video> for VideoSummary {
    fn from(video: &Video) -> Self {
        Self {
            id: video.id,
            title: video.title.clone(),
            youtube_id: video.youtube_id.clone(),
            thumbnail_url: video.thumbnail_url.clone(),
            channel_name: video.channel_name.clone(),
            duration_seconds: video.duration_seconds,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewVideo {
    pub youtube_id: String,
    pub title: String,
    pub description: Option<String>,
    pub channel_name: String,
    pub duration_seconds: Option<i32>,
    pub thumbnail_url: String,
    pub language: String,
    pub category_id: Option<Uuid>,
    pub submitted_by: Uuid,
}

/// Filters accepted by the video listing. Also serialized into the cache key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoFilters {
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub language: Option<String>,
    pub featured: Option<bool>,
    pub limit: Option<i64>,
}

impl VideoFilters {
    pub const DEFAULT_LIMIT: i64 = 100;
    pub const MAX_LIMIT: i64 = 500;

    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    /// Search text with surrounding whitespace removed; blank means no search.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
