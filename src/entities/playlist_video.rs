use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::video::VideoSummary;

/// Join row between a playlist and a video. Positions are 0-based and meant
/// to be contiguous per playlist; a reorder rewrites all of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistVideo {
    pub id: Uuid,
    pub playlist_id: Uuid,
    pub video_id: Uuid,
    pub position: i32,
    pub added_by: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistVideoView {
    #[serde(flatten)]
    pub entry: PlaylistVideo,
    pub video: Option<VideoSummary>,
}

#[derive(Debug, Clone)]
pub struct NewPlaylistVideo {
    pub playlist_id: Uuid,
    pub video_id: Uuid,
    pub position: i32,
    pub added_by: Option<Uuid>,
    pub notes: Option<String>,
}
