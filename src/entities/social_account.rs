use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const PLATFORMS: [&str; 7] = [
    "instagram",
    "github",
    "youtube",
    "twitter",
    "linkedin",
    "facebook",
    "website",
];

/// External link on a profile. Unique per (user_id, platform).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSocialAccount {
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSocialAccount {
    pub platform: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialAccountChanges {
    pub platform: Option<String>,
    pub url: Option<String>,
}
