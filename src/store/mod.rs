//! The database boundary.
//!
//! Handlers only see the [`Store`] trait. [`postgres::PgStore`] talks to the
//! hosted Postgres instance through `sqlx`; [`memory::MemoryStore`] keeps the
//! same tables in process for tests and for running without a database.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::category::Category;
use crate::entities::collaborator::{CollaboratorView, PlaylistCollaborator};
use crate::entities::playlist::{Playlist, PlaylistChanges, PlaylistQuery, PlaylistView, NewPlaylist};
use crate::entities::playlist_video::{NewPlaylistVideo, PlaylistVideo, PlaylistVideoView};
use crate::entities::profile::{Profile, ProfileChanges};
use crate::entities::progress::{PlaylistProgress, ProgressUpsert};
use crate::entities::social_account::{NewSocialAccount, SocialAccountChanges, UserSocialAccount};
use crate::entities::video::{NewVideo, Video, VideoFilters};
use crate::errors::AppError;
use crate::flyweights::role::RoleId;

#[async_trait]
pub trait Store: Send + Sync {
    async fn list_videos(&self, filters: &VideoFilters) -> Result<Vec<Video>, AppError>;
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError>;
    async fn insert_video(&self, video: NewVideo) -> Result<Video, AppError>;
    /// Atomically adds one view and returns the new count.
    async fn increment_view_count(&self, id: Uuid) -> Result<i32, AppError>;
    async fn count_videos(&self) -> Result<i64, AppError>;
    async fn count_profiles(&self) -> Result<i64, AppError>;
    /// Flags the `limit` most viewed videos as featured; returns how many rows changed.
    async fn mark_top_videos_as_featured(&self, limit: i32) -> Result<i64, AppError>;

    async fn list_categories(&self) -> Result<Vec<Category>, AppError>;
    async fn get_category(&self, id: Uuid) -> Result<Option<Category>, AppError>;

    async fn list_playlists(&self, query: &PlaylistQuery) -> Result<Vec<PlaylistView>, AppError>;
    async fn get_playlist(&self, id: Uuid) -> Result<Option<PlaylistView>, AppError>;
    async fn insert_playlist(&self, author_id: Uuid, playlist: NewPlaylist) -> Result<Playlist, AppError>;
    async fn update_playlist(&self, id: Uuid, changes: PlaylistChanges) -> Result<Playlist, AppError>;
    async fn delete_playlist(&self, id: Uuid) -> Result<(), AppError>;

    async fn list_playlist_videos(&self, playlist_id: Uuid) -> Result<Vec<PlaylistVideoView>, AppError>;
    async fn max_playlist_position(&self, playlist_id: Uuid) -> Result<Option<i32>, AppError>;
    async fn insert_playlist_video(&self, entry: NewPlaylistVideo) -> Result<PlaylistVideo, AppError>;
    async fn delete_playlist_video(&self, playlist_id: Uuid, video_id: Uuid) -> Result<(), AppError>;
    async fn set_playlist_video_position(
        &self,
        playlist_id: Uuid,
        video_id: Uuid,
        position: i32,
    ) -> Result<(), AppError>;

    async fn list_collaborators(&self, playlist_id: Uuid) -> Result<Vec<CollaboratorView>, AppError>;
    async fn collaborating_playlist_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError>;
    async fn insert_collaborator(
        &self,
        playlist_id: Uuid,
        user_id: Uuid,
        role: RoleId,
    ) -> Result<PlaylistCollaborator, AppError>;
    async fn update_collaborator_role(&self, playlist_id: Uuid, user_id: Uuid, role: RoleId) -> Result<(), AppError>;
    async fn delete_collaborator(&self, playlist_id: Uuid, user_id: Uuid) -> Result<(), AppError>;

    async fn list_progress(&self, playlist_id: Uuid, user_id: Uuid) -> Result<Vec<PlaylistProgress>, AppError>;
    async fn upsert_progress(&self, entry: ProgressUpsert) -> Result<PlaylistProgress, AppError>;

    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, AppError>;
    async fn get_profile_by_username(&self, username: &str) -> Result<Option<Profile>, AppError>;
    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> Result<Profile, AppError>;

    async fn list_social_accounts(&self, user_id: Uuid) -> Result<Vec<UserSocialAccount>, AppError>;
    async fn get_social_account(&self, id: Uuid) -> Result<Option<UserSocialAccount>, AppError>;
    async fn insert_social_account(
        &self,
        user_id: Uuid,
        account: NewSocialAccount,
    ) -> Result<UserSocialAccount, AppError>;
    async fn update_social_account(
        &self,
        id: Uuid,
        changes: SocialAccountChanges,
    ) -> Result<UserSocialAccount, AppError>;
    async fn delete_social_account(&self, id: Uuid) -> Result<(), AppError>;
}
