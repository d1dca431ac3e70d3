//! Cache keys for query results. A key is its segments joined with `:`;
//! the first segment names the query family and is what mutations invalidate.

use serde::Serialize;
use uuid::Uuid;

pub const VIDEOS: &str = "videos";
pub const VIDEO: &str = "video";
pub const VIDEO_COUNT: &str = "videoCount";
pub const CONTRIBUTOR_COUNT: &str = "contributorCount";
pub const CATEGORIES: &str = "categories";
pub const PLAYLISTS: &str = "playlists";
pub const PLAYLIST: &str = "playlist";
pub const PLAYLIST_VIDEOS: &str = "playlist-videos";
pub const PLAYLIST_COLLABORATORS: &str = "playlist-collaborators";
pub const PLAYLIST_PROGRESS: &str = "playlist-progress";
pub const PROFILE: &str = "profile";
pub const PROFILE_BY_USERNAME: &str = "profileByUsername";
pub const USER_SOCIAL_ACCOUNTS: &str = "userSocialAccounts";

fn join(segments: &[&str]) -> String {
    segments.join(":")
}

fn encode<T: Serialize>(filters: &T) -> String {
    serde_json::to_string(filters).unwrap_or_default()
}

pub fn videos<T: Serialize>(filters: &T) -> String {
    join(&[VIDEOS, &encode(filters)])
}

pub fn video(id: Uuid) -> String {
    join(&[VIDEO, &id.to_string()])
}

pub fn categories_list() -> String {
    join(&[CATEGORIES, "list"])
}

pub fn playlists<T: Serialize>(filters: &T) -> String {
    join(&[PLAYLISTS, &encode(filters)])
}

pub fn user_playlists<T: Serialize>(filters: &T, user_id: Uuid) -> String {
    join(&[PLAYLISTS, &encode(filters), &user_id.to_string()])
}

pub fn playlist(id: Uuid) -> String {
    join(&[PLAYLIST, &id.to_string()])
}

pub fn playlist_videos(id: Uuid) -> String {
    join(&[PLAYLIST_VIDEOS, &id.to_string()])
}

pub fn playlist_collaborators(id: Uuid) -> String {
    join(&[PLAYLIST_COLLABORATORS, &id.to_string()])
}

pub fn playlist_progress(id: Uuid, user_id: Uuid) -> String {
    join(&[PLAYLIST_PROGRESS, &id.to_string(), &user_id.to_string()])
}

pub fn profile(id: Uuid) -> String {
    join(&[PROFILE, &id.to_string()])
}

pub fn profile_by_username(username: &str) -> String {
    join(&[PROFILE_BY_USERNAME, username])
}

pub fn user_social_accounts(user_id: Uuid) -> String {
    join(&[USER_SOCIAL_ACCOUNTS, "list", &user_id.to_string()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::video::VideoFilters;

    #[test]
    fn filter_keys_share_the_family_prefix() {
        let key = videos(&VideoFilters {
            search: Some("rust".into()),
            ..Default::default()
        });
        assert!(key.starts_with("videos:{"));
        assert!(key.contains("\"search\":\"rust\""));
    }

    #[test]
    fn progress_key_is_per_user() {
        let playlist = Uuid::new_v4();
        assert_ne!(
            playlist_progress(playlist, Uuid::new_v4()),
            playlist_progress(playlist, Uuid::new_v4())
        );
    }
}
