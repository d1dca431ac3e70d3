use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use super::Store;
use crate::entities::category::Category;
use crate::entities::collaborator::{CollaboratorView, PlaylistCollaborator};
use crate::entities::playlist::{NewPlaylist, Playlist, PlaylistChanges, PlaylistQuery, PlaylistView};
use crate::entities::playlist_video::{NewPlaylistVideo, PlaylistVideo, PlaylistVideoView};
use crate::entities::profile::{Profile, ProfileChanges, ProfileSummary};
use crate::entities::progress::{PlaylistProgress, ProgressUpsert};
use crate::entities::social_account::{NewSocialAccount, SocialAccountChanges, UserSocialAccount};
use crate::entities::video::{NewVideo, Video, VideoFilters, VideoSummary};
use crate::errors::AppError;
use crate::flyweights::role::RoleId;

#[derive(Debug, Default)]
struct Tables {
    videos: Vec<Video>,
    categories: Vec<Category>,
    playlists: Vec<Playlist>,
    playlist_videos: Vec<PlaylistVideo>,
    collaborators: Vec<PlaylistCollaborator>,
    progress: Vec<PlaylistProgress>,
    profiles: Vec<Profile>,
    social_accounts: Vec<UserSocialAccount>,
}

impl Tables {
    fn playlist_view(&self, playlist: &Playlist) -> PlaylistView {
        PlaylistView {
            playlist: playlist.clone(),
            author: self
                .profiles
                .iter()
                .find(|p| p.id == playlist.author_id)
                .map(ProfileSummary::from),
            video_count: self
                .playlist_videos
                .iter()
                .filter(|pv| pv.playlist_id == playlist.id)
                .count() as i64,
        }
    }
}

/// In-process tables mirroring the hosted schema, including its unique
/// constraints and the cascades on playlist deletion.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail as if the database were unreachable.
    #[cfg(test)]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Profiles are created by the auth service; this stands in for it.
    #[cfg(test)]
    pub fn insert_profile(&self, profile: Profile) {
        self.tables.write().profiles.push(profile);
    }

    #[cfg(test)]
    pub fn insert_category(&self, category: Category) {
        self.tables.write().categories.push(category);
    }

    /// Replaces a stored category row, as an admin edit on the hosted side would.
    #[cfg(test)]
    pub fn replace_category(&self, category: Category) {
        let mut tables = self.tables.write();
        if let Some(existing) = tables.categories.iter_mut().find(|c| c.id == category.id) {
            *existing = category;
        }
    }

    fn check(&self) -> Result<(), AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Database(anyhow::anyhow!(
                "In-memory store is marked unavailable"
            )));
        }
        Ok(())
    }
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack
        .map(|h| h.to_lowercase().contains(&needle.to_lowercase()))
        .unwrap_or(false)
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_videos(&self, filters: &VideoFilters) -> Result<Vec<Video>, AppError> {
        self.check()?;
        let tables = self.tables.read();
        let mut videos: Vec<Video> = tables
            .videos
            .iter()
            .filter(|v| {
                filters.search_term().map_or(true, |term| {
                    contains_ci(Some(&v.title), term)
                        || contains_ci(v.description.as_deref(), term)
                        || contains_ci(Some(&v.channel_name), term)
                })
            })
            .filter(|v| filters.category_id.map_or(true, |c| v.category_id == Some(c)))
            .filter(|v| filters.language.as_deref().map_or(true, |l| v.language == l))
            .filter(|v| filters.featured.map_or(true, |f| v.is_featured == f))
            .cloned()
            .collect();

        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        videos.truncate(filters.effective_limit() as usize);
        Ok(videos)
    }

    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        self.check()?;
        Ok(self.tables.read().videos.iter().find(|v| v.id == id).cloned())
    }

    async fn insert_video(&self, video: NewVideo) -> Result<Video, AppError> {
        self.check()?;
        let mut tables = self.tables.write();
        if tables.videos.iter().any(|v| v.youtube_id == video.youtube_id) {
            return Err(AppError::Conflict(format!(
                "Video {} was already submitted",
                video.youtube_id
            )));
        }

        let row = Video {
            id: Uuid::new_v4(),
            youtube_id: video.youtube_id,
            title: video.title,
            description: video.description,
            channel_name: video.channel_name,
            duration_seconds: video.duration_seconds,
            thumbnail_url: video.thumbnail_url,
            language: video.language,
            category_id: video.category_id,
            submitted_by: Some(video.submitted_by),
            created_at: Utc::now(),
            view_count: 0,
            is_featured: false,
        };
        tables.videos.push(row.clone());

        if let Some(profile) = tables.profiles.iter_mut().find(|p| p.id == video.submitted_by) {
            profile.submissions_count += 1;
        }
        Ok(row)
    }

    async fn increment_view_count(&self, id: Uuid) -> Result<i32, AppError> {
        self.check()?;
        let mut tables = self.tables.write();
        let video = tables
            .videos
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?;
        video.view_count += 1;
        Ok(video.view_count)
    }

    async fn count_videos(&self) -> Result<i64, AppError> {
        self.check()?;
        Ok(self.tables.read().videos.len() as i64)
    }

    async fn count_profiles(&self) -> Result<i64, AppError> {
        self.check()?;
        Ok(self.tables.read().profiles.len() as i64)
    }

    async fn mark_top_videos_as_featured(&self, limit: i32) -> Result<i64, AppError> {
        self.check()?;
        let mut tables = self.tables.write();

        let mut ranked: Vec<(Uuid, i32)> = tables.videos.iter().map(|v| (v.id, v.view_count)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        let top: Vec<Uuid> = ranked
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|(id, _)| id)
            .collect();

        for video in tables.videos.iter_mut() {
            video.is_featured = top.contains(&video.id);
        }
        Ok(top.len() as i64)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        self.check()?;
        let mut categories = self.tables.read().categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_category(&self, id: Uuid) -> Result<Option<Category>, AppError> {
        self.check()?;
        Ok(self.tables.read().categories.iter().find(|c| c.id == id).cloned())
    }

    async fn list_playlists(&self, query: &PlaylistQuery) -> Result<Vec<PlaylistView>, AppError> {
        self.check()?;
        let tables = self.tables.read();
        let mut playlists: Vec<&Playlist> = tables
            .playlists
            .iter()
            .filter(|p| query.author_id.map_or(true, |a| p.author_id == a))
            .filter(|p| query.is_public.map_or(true, |public| p.is_public == public))
            .filter(|p| {
                query.search_term().map_or(true, |term| {
                    contains_ci(Some(&p.name), term) || contains_ci(p.description.as_deref(), term)
                })
            })
            .collect();

        playlists.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(playlists.into_iter().map(|p| tables.playlist_view(p)).collect())
    }

    async fn get_playlist(&self, id: Uuid) -> Result<Option<PlaylistView>, AppError> {
        self.check()?;
        let tables = self.tables.read();
        Ok(tables
            .playlists
            .iter()
            .find(|p| p.id == id)
            .map(|p| tables.playlist_view(p)))
    }

    async fn insert_playlist(&self, author_id: Uuid, playlist: NewPlaylist) -> Result<Playlist, AppError> {
        self.check()?;
        let mut tables = self.tables.write();
        if tables.playlists.iter().any(|p| p.slug == playlist.slug) {
            return Err(AppError::Conflict(format!(
                "A playlist with slug '{}' already exists",
                playlist.slug
            )));
        }

        let now = Utc::now();
        let row = Playlist {
            id: Uuid::new_v4(),
            name: playlist.name,
            slug: playlist.slug,
            description: playlist.description,
            author_id,
            thumbnail_url: playlist.thumbnail_url,
            course_code: playlist.course_code,
            unit_code: playlist.unit_code,
            language: playlist.language,
            is_public: playlist.is_public,
            is_ordered: playlist.is_ordered,
            created_at: now,
            updated_at: now,
        };
        tables.playlists.push(row.clone());
        Ok(row)
    }

    async fn update_playlist(&self, id: Uuid, changes: PlaylistChanges) -> Result<Playlist, AppError> {
        self.check()?;
        let mut tables = self.tables.write();

        if let Some(slug) = &changes.slug {
            if tables.playlists.iter().any(|p| p.id != id && &p.slug == slug) {
                return Err(AppError::Conflict(format!(
                    "A playlist with slug '{}' already exists",
                    slug
                )));
            }
        }

        let playlist = tables
            .playlists
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Playlist {} not found", id)))?;

        if let Some(name) = changes.name {
            playlist.name = name;
        }
        if let Some(slug) = changes.slug {
            playlist.slug = slug;
        }
        if let Some(description) = changes.description {
            playlist.description = Some(description);
        }
        if let Some(thumbnail_url) = changes.thumbnail_url {
            playlist.thumbnail_url = Some(thumbnail_url);
        }
        if let Some(course_code) = changes.course_code {
            playlist.course_code = Some(course_code);
        }
        if let Some(unit_code) = changes.unit_code {
            playlist.unit_code = Some(unit_code);
        }
        if let Some(language) = changes.language {
            playlist.language = language;
        }
        if let Some(is_public) = changes.is_public {
            playlist.is_public = is_public;
        }
        if let Some(is_ordered) = changes.is_ordered {
            playlist.is_ordered = is_ordered;
        }
        playlist.updated_at = Utc::now();

        Ok(playlist.clone())
    }

    async fn delete_playlist(&self, id: Uuid) -> Result<(), AppError> {
        self.check()?;
        let mut tables = self.tables.write();
        tables.playlists.retain(|p| p.id != id);
        tables.playlist_videos.retain(|pv| pv.playlist_id != id);
        tables.collaborators.retain(|c| c.playlist_id != id);
        tables.progress.retain(|p| p.playlist_id != id);
        Ok(())
    }

    async fn list_playlist_videos(&self, playlist_id: Uuid) -> Result<Vec<PlaylistVideoView>, AppError> {
        self.check()?;
        let tables = self.tables.read();
        let mut entries: Vec<PlaylistVideoView> = tables
            .playlist_videos
            .iter()
            .filter(|pv| pv.playlist_id == playlist_id)
            .map(|pv| PlaylistVideoView {
                entry: pv.clone(),
                video: tables
                    .videos
                    .iter()
                    .find(|v| v.id == pv.video_id)
                    .map(VideoSummary::from),
            })
            .collect();

        entries.sort_by_key(|view| view.entry.position);
        Ok(entries)
    }

    async fn max_playlist_position(&self, playlist_id: Uuid) -> Result<Option<i32>, AppError> {
        self.check()?;
        Ok(self
            .tables
            .read()
            .playlist_videos
            .iter()
            .filter(|pv| pv.playlist_id == playlist_id)
            .map(|pv| pv.position)
            .max())
    }

    async fn insert_playlist_video(&self, entry: NewPlaylistVideo) -> Result<PlaylistVideo, AppError> {
        self.check()?;
        let mut tables = self.tables.write();
        if tables
            .playlist_videos
            .iter()
            .any(|pv| pv.playlist_id == entry.playlist_id && pv.video_id == entry.video_id)
        {
            return Err(AppError::Conflict(
                "Video is already in this playlist".to_string(),
            ));
        }

        let row = PlaylistVideo {
            id: Uuid::new_v4(),
            playlist_id: entry.playlist_id,
            video_id: entry.video_id,
            position: entry.position,
            added_by: entry.added_by,
            notes: entry.notes,
            created_at: Utc::now(),
        };
        tables.playlist_videos.push(row.clone());
        Ok(row)
    }

    async fn delete_playlist_video(&self, playlist_id: Uuid, video_id: Uuid) -> Result<(), AppError> {
        self.check()?;
        self.tables
            .write()
            .playlist_videos
            .retain(|pv| !(pv.playlist_id == playlist_id && pv.video_id == video_id));
        Ok(())
    }

    async fn set_playlist_video_position(
        &self,
        playlist_id: Uuid,
        video_id: Uuid,
        position: i32,
    ) -> Result<(), AppError> {
        self.check()?;
        let mut tables = self.tables.write();
        for entry in tables
            .playlist_videos
            .iter_mut()
            .filter(|pv| pv.playlist_id == playlist_id && pv.video_id == video_id)
        {
            entry.position = position;
        }
        Ok(())
    }

    async fn list_collaborators(&self, playlist_id: Uuid) -> Result<Vec<CollaboratorView>, AppError> {
        self.check()?;
        let tables = self.tables.read();
        Ok(tables
            .collaborators
            .iter()
            .filter(|c| c.playlist_id == playlist_id)
            .map(|c| CollaboratorView {
                collaborator: c.clone(),
                profile: tables
                    .profiles
                    .iter()
                    .find(|p| p.id == c.user_id)
                    .map(ProfileSummary::from),
            })
            .collect())
    }

    async fn collaborating_playlist_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        self.check()?;
        Ok(self
            .tables
            .read()
            .collaborators
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|c| c.playlist_id)
            .collect())
    }

    async fn insert_collaborator(
        &self,
        playlist_id: Uuid,
        user_id: Uuid,
        role: RoleId,
    ) -> Result<PlaylistCollaborator, AppError> {
        self.check()?;
        let mut tables = self.tables.write();
        if tables
            .collaborators
            .iter()
            .any(|c| c.playlist_id == playlist_id && c.user_id == user_id)
        {
            return Err(AppError::Conflict(
                "User is already a collaborator on this playlist".to_string(),
            ));
        }

        let row = PlaylistCollaborator {
            id: Uuid::new_v4(),
            playlist_id,
            user_id,
            role,
            invited_at: Utc::now(),
        };
        tables.collaborators.push(row.clone());
        Ok(row)
    }

    async fn update_collaborator_role(&self, playlist_id: Uuid, user_id: Uuid, role: RoleId) -> Result<(), AppError> {
        self.check()?;
        let mut tables = self.tables.write();
        for collaborator in tables
            .collaborators
            .iter_mut()
            .filter(|c| c.playlist_id == playlist_id && c.user_id == user_id)
        {
            collaborator.role = role;
        }
        Ok(())
    }

    async fn delete_collaborator(&self, playlist_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        self.check()?;
        self.tables
            .write()
            .collaborators
            .retain(|c| !(c.playlist_id == playlist_id && c.user_id == user_id));
        Ok(())
    }

    async fn list_progress(&self, playlist_id: Uuid, user_id: Uuid) -> Result<Vec<PlaylistProgress>, AppError> {
        self.check()?;
        Ok(self
            .tables
            .read()
            .progress
            .iter()
            .filter(|p| p.playlist_id == playlist_id && p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn upsert_progress(&self, entry: ProgressUpsert) -> Result<PlaylistProgress, AppError> {
        self.check()?;
        let now = Utc::now();
        let watched_at = entry.watched_at(now);
        let mut tables = self.tables.write();

        if let Some(existing) = tables.progress.iter_mut().find(|p| {
            p.playlist_id == entry.playlist_id && p.user_id == entry.user_id && p.video_id == entry.video_id
        }) {
            existing.watched = entry.watched;
            existing.watched_at = watched_at;
            existing.last_position_seconds = entry.last_position_seconds;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let row = PlaylistProgress {
            id: Uuid::new_v4(),
            playlist_id: entry.playlist_id,
            user_id: entry.user_id,
            video_id: entry.video_id,
            watched: entry.watched,
            watched_at,
            last_position_seconds: entry.last_position_seconds,
            created_at: now,
            updated_at: now,
        };
        tables.progress.push(row.clone());
        Ok(row)
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, AppError> {
        self.check()?;
        Ok(self.tables.read().profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn get_profile_by_username(&self, username: &str) -> Result<Option<Profile>, AppError> {
        self.check()?;
        Ok(self
            .tables
            .read()
            .profiles
            .iter()
            .find(|p| p.username.as_deref() == Some(username))
            .cloned())
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> Result<Profile, AppError> {
        self.check()?;
        let mut tables = self.tables.write();

        if let Some(username) = changes.username.as_deref().filter(|u| !u.is_empty()) {
            if tables
                .profiles
                .iter()
                .any(|p| p.id != id && p.username.as_deref() == Some(username))
            {
                return Err(AppError::Conflict(format!(
                    "Username '{}' is already taken",
                    username
                )));
            }
        }

        let profile = tables
            .profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", id)))?;

        if let Some(username) = changes.username {
            profile.username = Some(username).filter(|u| !u.is_empty());
        }
        if let Some(display_name) = changes.display_name {
            profile.display_name = Some(display_name);
        }
        if let Some(avatar_url) = changes.avatar_url {
            profile.avatar_url = Some(avatar_url);
        }
        if let Some(bio) = changes.bio {
            profile.bio = Some(bio);
        }
        profile.updated_at = Utc::now();

        Ok(profile.clone())
    }

    async fn list_social_accounts(&self, user_id: Uuid) -> Result<Vec<UserSocialAccount>, AppError> {
        self.check()?;
        let mut accounts: Vec<UserSocialAccount> = self
            .tables
            .read()
            .social_accounts
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(accounts)
    }

    async fn get_social_account(&self, id: Uuid) -> Result<Option<UserSocialAccount>, AppError> {
        self.check()?;
        Ok(self
            .tables
            .read()
            .social_accounts
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn insert_social_account(
        &self,
        user_id: Uuid,
        account: NewSocialAccount,
    ) -> Result<UserSocialAccount, AppError> {
        self.check()?;
        let mut tables = self.tables.write();
        if tables
            .social_accounts
            .iter()
            .any(|a| a.user_id == user_id && a.platform == account.platform)
        {
            return Err(AppError::Conflict(format!(
                "A {} account is already linked",
                account.platform
            )));
        }

        let now = Utc::now();
        let row = UserSocialAccount {
            id: Uuid::new_v4(),
            user_id,
            platform: account.platform,
            url: account.url,
            created_at: now,
            updated_at: now,
        };
        tables.social_accounts.push(row.clone());
        Ok(row)
    }

    async fn update_social_account(
        &self,
        id: Uuid,
        changes: SocialAccountChanges,
    ) -> Result<UserSocialAccount, AppError> {
        self.check()?;
        let mut tables = self.tables.write();
        let account = tables
            .social_accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Social account {} not found", id)))?;

        if let Some(platform) = changes.platform {
            account.platform = platform;
        }
        if let Some(url) = changes.url {
            account.url = url;
        }
        account.updated_at = Utc::now();
        Ok(account.clone())
    }

    async fn delete_social_account(&self, id: Uuid) -> Result<(), AppError> {
        self.check()?;
        self.tables.write().social_accounts.retain(|a| a.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_video(youtube_id: &str, submitted_by: Uuid) -> NewVideo {
        NewVideo {
            youtube_id: youtube_id.to_string(),
            title: format!("Video {}", youtube_id),
            description: None,
            channel_name: "Channel".to_string(),
            duration_seconds: Some(60),
            thumbnail_url: String::new(),
            language: "pt".to_string(),
            category_id: None,
            submitted_by,
        }
    }

    #[tokio::test]
    async fn upsert_progress_keeps_one_row_per_key() {
        let store = MemoryStore::new();
        let entry = ProgressUpsert {
            playlist_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            video_id: Uuid::new_v4(),
            watched: true,
            last_position_seconds: 0,
        };

        let first = store.upsert_progress(entry.clone()).await.unwrap();
        let second = store
            .upsert_progress(ProgressUpsert {
                watched: false,
                ..entry.clone()
            })
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert!(second.watched_at.is_none());
        let rows = store.list_progress(entry.playlist_id, entry.user_id).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn mark_top_videos_flags_most_viewed() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let low = store.insert_video(new_video("aaaaaaaaaaa", user)).await.unwrap();
        let high = store.insert_video(new_video("bbbbbbbbbbb", user)).await.unwrap();
        store.increment_view_count(high.id).await.unwrap();

        let updated = store.mark_top_videos_as_featured(1).await.unwrap();
        assert_eq!(updated, 1);
        assert!(store.get_video(high.id).await.unwrap().unwrap().is_featured);
        assert!(!store.get_video(low.id).await.unwrap().unwrap().is_featured);
    }

    #[tokio::test]
    async fn duplicate_collaborator_is_a_conflict() {
        let store = MemoryStore::new();
        let playlist = Uuid::new_v4();
        let user = Uuid::new_v4();

        store.insert_collaborator(playlist, user, RoleId::Editor).await.unwrap();
        let err = store
            .insert_collaborator(playlist, user, RoleId::Viewer)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_call() {
        let store = MemoryStore::new();
        store.set_unavailable(true);

        let err = store.count_videos().await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
