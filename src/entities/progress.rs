use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Watched state of one video in one playlist for one user.
/// Unique on (playlist_id, user_id, video_id); always written by upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistProgress {
    pub id: Uuid,
    pub playlist_id: Uuid,
    pub user_id: Uuid,
    pub video_id: Uuid,
    pub watched: bool,
    pub watched_at: Option<DateTime<Utc>>,
    pub last_position_seconds: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ProgressUpsert {
    pub playlist_id: Uuid,
    pub user_id: Uuid,
    pub video_id: Uuid,
    pub watched: bool,
    pub last_position_seconds: i32,
}

impl ProgressUpsert {
    /// `watched_at` is stamped when marking watched and cleared otherwise.
    pub fn watched_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.watched.then_some(now)
    }
}
