use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::profile::ProfileSummary;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub author_id: Uuid,
    pub thumbnail_url: Option<String>,
    pub course_code: Option<String>,
    pub unit_code: Option<String>,
    pub language: String,
    pub is_public: bool,
    pub is_ordered: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A playlist as listed: the row plus its author and number of entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistView {
    #[serde(flatten)]
    pub playlist: Playlist,
    pub author: Option<ProfileSummary>,
    pub video_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlaylist {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub course_code: Option<String>,
    pub unit_code: Option<String>,
    pub language: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub is_ordered: bool,
}

/// Partial update; `None` leaves a column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub course_code: Option<String>,
    pub unit_code: Option<String>,
    pub language: Option<String>,
    pub is_public: Option<bool>,
    pub is_ordered: Option<bool>,
}

/// Which playlists a signed-in user wants to see.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistScope {
    #[default]
    All,
    My,
    Collaborating,
}

/// Query string of the playlist listings. Also serialized into the cache key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistListParams {
    pub author_id: Option<Uuid>,
    pub is_public: Option<bool>,
    pub search: Option<String>,
    #[serde(default)]
    pub filter: PlaylistScope,
}

/// What the store filters on; scope handling happens before this is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaylistQuery {
    pub author_id: Option<Uuid>,
    pub is_public: Option<bool>,
    pub search: Option<String>,
}

impl PlaylistQuery {
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
