use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::profile::ProfileSummary;
use crate::flyweights::role::RoleId;

/// At most one row exists per (playlist_id, user_id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistCollaborator {
    pub id: Uuid,
    pub playlist_id: Uuid,
    pub user_id: Uuid,
    #[sqlx(try_from = "String")]
    pub role: RoleId,
    pub invited_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorView {
    #[serde(flatten)]
    pub collaborator: PlaylistCollaborator,
    pub profile: Option<ProfileSummary>,
}
