use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
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

const VIDEO_COLUMNS: &str = "id, youtube_id, title, description, channel_name, duration_seconds, \
     thumbnail_url, language, category_id, submitted_by, created_at, view_count, is_featured";

const PLAYLIST_VIEW_SELECT: &str = r#"
    SELECT p.id, p.name, p.slug, p.description, p.author_id, p.thumbnail_url,
           p.course_code, p.unit_code, p.language, p.is_public, p.is_ordered,
           p.created_at, p.updated_at,
           a.username AS author_username,
           a.display_name AS author_display_name,
           a.avatar_url AS author_avatar_url,
           (a.id IS NOT NULL) AS has_author,
           (SELECT COUNT(*) FROM playlist_videos pv WHERE pv.playlist_id = p.id) AS video_count
    FROM playlists p
    LEFT JOIN profiles a ON a.id = p.author_id
"#;

const PROFILE_COLUMNS: &str =
    "id, username, display_name, avatar_url, bio, submissions_count, created_at, updated_at";

const SOCIAL_COLUMNS: &str = "id, user_id, platform, url, created_at, updated_at";

const PROGRESS_COLUMNS: &str = "id, playlist_id, user_id, video_id, watched, watched_at, \
     last_position_seconds, created_at, updated_at";

#[derive(FromRow)]
struct PlaylistViewRow {
    #[sqlx(flatten)]
    playlist: Playlist,
    author_username: Option<String>,
    author_display_name: Option<String>,
    author_avatar_url: Option<String>,
    has_author: bool,
    video_count: i64,
}

impl From<PlaylistViewRow> for PlaylistView {
    fn from(row: PlaylistViewRow) -> Self {
        let author = row.has_author.then(|| ProfileSummary {
            id: row.playlist.author_id,
            username: row.author_username,
            display_name: row.author_display_name,
            avatar_url: row.author_avatar_url,
        });
        Self {
            playlist: row.playlist,
            author,
            video_count: row.video_count,
        }
    }
}

#[derive(FromRow)]
struct PlaylistVideoRow {
    #[sqlx(flatten)]
    entry: PlaylistVideo,
    v_title: Option<String>,
    v_youtube_id: Option<String>,
    v_thumbnail_url: Option<String>,
    v_channel_name: Option<String>,
    v_duration_seconds: Option<i32>,
}

impl From<PlaylistVideoRow> for PlaylistVideoView {
    fn from(row: PlaylistVideoRow) -> Self {
        let video = match (row.v_title, row.v_youtube_id) {
            (Some(title), Some(youtube_id)) => Some(VideoSummary {
                id: row.entry.video_id,
                title,
                youtube_id,
                thumbnail_url: row.v_thumbnail_url.unwrap_or_default(),
                channel_name: row.v_channel_name.unwrap_or_default(),
                duration_seconds: row.v_duration_seconds,
            }),
            _ => None,
        };
        Self {
            entry: row.entry,
            video,
        }
    }
}

#[derive(FromRow)]
struct CollaboratorRow {
    #[sqlx(flatten)]
    collaborator: PlaylistCollaborator,
    username: Option<String>,
    display_name: Option<String>,
    avatar_url: Option<String>,
    has_profile: bool,
}

impl From<CollaboratorRow> for CollaboratorView {
    fn from(row: CollaboratorRow) -> Self {
        let profile = row.has_profile.then(|| ProfileSummary {
            id: row.collaborator.user_id,
            username: row.username,
            display_name: row.display_name,
            avatar_url: row.avatar_url,
        });
        Self {
            collaborator: row.collaborator,
            profile,
        }
    }
}

#[derive(FromRow)]
struct CountRow {
    count: i64,
}

/// Store backed by the hosted Postgres database. Every query is bounded by
/// the configured timeout.
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgStore {
    pub async fn connect(database_url: &Secret<String>, timeout: Duration) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(timeout)
            .connect(database_url.expose_secret())
            .await?;
        tracing::info!("Connected to Postgres");
        Ok(Self { pool, timeout })
    }

    async fn timed<T, F>(&self, operation: &'static str, query: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, query).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::error!("{}: Database error: {:?}", operation, e);
                Err(AppError::from(e))
            }
            Err(elapsed) => {
                tracing::error!("{}: Timeout after {:?}", operation, self.timeout);
                Err(AppError::Timeout(elapsed))
            }
        }
    }

    async fn fetch_playlist_view(&self, id: Uuid) -> Result<Option<PlaylistView>, AppError> {
        let sql = format!("{} WHERE p.id = $1", PLAYLIST_VIEW_SELECT);
        let row = self
            .timed(
                "get_playlist",
                sqlx::query_as::<_, PlaylistViewRow>(&sql)
                    .bind(id)
                    .fetch_optional(&self.pool),
            )
            .await?;
        Ok(row.map(PlaylistView::from))
    }
}

fn like_pattern(term: &str) -> String {
    format!("%{}%", term.replace('%', "\\%").replace('_', "\\_"))
}

#[async_trait]
impl Store for PgStore {
    async fn list_videos(&self, filters: &VideoFilters) -> Result<Vec<Video>, AppError> {
        let sql = format!(
            r#"SELECT {} FROM videos
               WHERE ($1::text IS NULL OR title ILIKE $1 OR description ILIKE $1 OR channel_name ILIKE $1)
                 AND ($2::uuid IS NULL OR category_id = $2)
                 AND ($3::text IS NULL OR language = $3)
                 AND ($4::bool IS NULL OR is_featured = $4)
               ORDER BY created_at DESC
               LIMIT $5"#,
            VIDEO_COLUMNS
        );
        self.timed(
            "list_videos",
            sqlx::query_as::<_, Video>(&sql)
                .bind(filters.search_term().map(like_pattern))
                .bind(filters.category_id)
                .bind(filters.language.as_deref())
                .bind(filters.featured)
                .bind(filters.effective_limit())
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        let sql = format!("SELECT {} FROM videos WHERE id = $1", VIDEO_COLUMNS);
        self.timed(
            "get_video",
            sqlx::query_as::<_, Video>(&sql).bind(id).fetch_optional(&self.pool),
        )
        .await
    }

    async fn insert_video(&self, video: NewVideo) -> Result<Video, AppError> {
        let sql = format!(
            r#"INSERT INTO videos (youtube_id, title, description, channel_name, duration_seconds,
                                   thumbnail_url, language, category_id, submitted_by)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING {}"#,
            VIDEO_COLUMNS
        );
        self.timed(
            "insert_video",
            sqlx::query_as::<_, Video>(&sql)
                .bind(&video.youtube_id)
                .bind(&video.title)
                .bind(&video.description)
                .bind(&video.channel_name)
                .bind(video.duration_seconds)
                .bind(&video.thumbnail_url)
                .bind(&video.language)
                .bind(video.category_id)
                .bind(video.submitted_by)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn increment_view_count(&self, id: Uuid) -> Result<i32, AppError> {
        let count: Option<(i32,)> = self
            .timed(
                "increment_view_count",
                sqlx::query_as(
                    "UPDATE videos SET view_count = view_count + 1 WHERE id = $1 RETURNING view_count",
                )
                .bind(id)
                .fetch_optional(&self.pool),
            )
            .await?;
        count
            .map(|(c,)| c)
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))
    }

    async fn count_videos(&self) -> Result<i64, AppError> {
        let row = self
            .timed(
                "count_videos",
                sqlx::query_as::<_, CountRow>("SELECT COUNT(*) AS count FROM videos").fetch_one(&self.pool),
            )
            .await?;
        Ok(row.count)
    }

    async fn count_profiles(&self) -> Result<i64, AppError> {
        let row = self
            .timed(
                "count_profiles",
                sqlx::query_as::<_, CountRow>("SELECT COUNT(*) AS count FROM profiles").fetch_one(&self.pool),
            )
            .await?;
        Ok(row.count)
    }

    async fn mark_top_videos_as_featured(&self, limit: i32) -> Result<i64, AppError> {
        let (updated,): (Option<i64>,) = self
            .timed(
                "mark_top_videos_as_featured",
                sqlx::query_as("SELECT mark_top_videos_as_featured($1)::bigint")
                    .bind(limit)
                    .fetch_one(&self.pool),
            )
            .await?;
        Ok(updated.unwrap_or(0))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        self.timed(
            "list_categories",
            sqlx::query_as::<_, Category>(
                "SELECT id, name, slug, icon, color, created_at FROM categories ORDER BY name",
            )
            .fetch_all(&self.pool),
        )
        .await
    }

    async fn get_category(&self, id: Uuid) -> Result<Option<Category>, AppError> {
        self.timed(
            "get_category",
            sqlx::query_as::<_, Category>(
                "SELECT id, name, slug, icon, color, created_at FROM categories WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await
    }

    async fn list_playlists(&self, query: &PlaylistQuery) -> Result<Vec<PlaylistView>, AppError> {
        let sql = format!(
            r#"{}
               WHERE ($1::uuid IS NULL OR p.author_id = $1)
                 AND ($2::bool IS NULL OR p.is_public = $2)
                 AND ($3::text IS NULL OR p.name ILIKE $3 OR p.description ILIKE $3)
               ORDER BY p.created_at DESC"#,
            PLAYLIST_VIEW_SELECT
        );
        let rows = self
            .timed(
                "list_playlists",
                sqlx::query_as::<_, PlaylistViewRow>(&sql)
                    .bind(query.author_id)
                    .bind(query.is_public)
                    .bind(query.search_term().map(like_pattern))
                    .fetch_all(&self.pool),
            )
            .await?;
        Ok(rows.into_iter().map(PlaylistView::from).collect())
    }

    async fn get_playlist(&self, id: Uuid) -> Result<Option<PlaylistView>, AppError> {
        self.fetch_playlist_view(id).await
    }

    async fn insert_playlist(&self, author_id: Uuid, playlist: NewPlaylist) -> Result<Playlist, AppError> {
        self.timed(
            "insert_playlist",
            sqlx::query_as::<_, Playlist>(
                r#"INSERT INTO playlists (name, slug, description, author_id, thumbnail_url,
                                          course_code, unit_code, language, is_public, is_ordered)
                   VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                   RETURNING *"#,
            )
            .bind(&playlist.name)
            .bind(&playlist.slug)
            .bind(&playlist.description)
            .bind(author_id)
            .bind(&playlist.thumbnail_url)
            .bind(&playlist.course_code)
            .bind(&playlist.unit_code)
            .bind(&playlist.language)
            .bind(playlist.is_public)
            .bind(playlist.is_ordered)
            .fetch_one(&self.pool),
        )
        .await
    }

    async fn update_playlist(&self, id: Uuid, changes: PlaylistChanges) -> Result<Playlist, AppError> {
        let updated = self
            .timed(
                "update_playlist",
                sqlx::query_as::<_, Playlist>(
                    r#"UPDATE playlists SET
                         name = COALESCE($2, name),
                         slug = COALESCE($3, slug),
                         description = COALESCE($4, description),
                         thumbnail_url = COALESCE($5, thumbnail_url),
                         course_code = COALESCE($6, course_code),
                         unit_code = COALESCE($7, unit_code),
                         language = COALESCE($8, language),
                         is_public = COALESCE($9, is_public),
                         is_ordered = COALESCE($10, is_ordered),
                         updated_at = NOW()
                       WHERE id = $1
                       RETURNING *"#,
                )
                .bind(id)
                .bind(&changes.name)
                .bind(&changes.slug)
                .bind(&changes.description)
                .bind(&changes.thumbnail_url)
                .bind(&changes.course_code)
                .bind(&changes.unit_code)
                .bind(&changes.language)
                .bind(changes.is_public)
                .bind(changes.is_ordered)
                .fetch_optional(&self.pool),
            )
            .await?;
        updated.ok_or_else(|| AppError::NotFound(format!("Playlist {} not found", id)))
    }

    async fn delete_playlist(&self, id: Uuid) -> Result<(), AppError> {
        self.timed(
            "delete_playlist",
            sqlx::query("DELETE FROM playlists WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn list_playlist_videos(&self, playlist_id: Uuid) -> Result<Vec<PlaylistVideoView>, AppError> {
        let rows = self
            .timed(
                "list_playlist_videos",
                sqlx::query_as::<_, PlaylistVideoRow>(
                    r#"SELECT pv.id, pv.playlist_id, pv.video_id, pv.position, pv.added_by,
                              pv.notes, pv.created_at,
                              v.title AS v_title, v.youtube_id AS v_youtube_id,
                              v.thumbnail_url AS v_thumbnail_url, v.channel_name AS v_channel_name,
                              v.duration_seconds AS v_duration_seconds
                       FROM playlist_videos pv
                       LEFT JOIN videos v ON v.id = pv.video_id
                       WHERE pv.playlist_id = $1
                       ORDER BY pv.position ASC"#,
                )
                .bind(playlist_id)
                .fetch_all(&self.pool),
            )
            .await?;
        Ok(rows.into_iter().map(PlaylistVideoView::from).collect())
    }

    async fn max_playlist_position(&self, playlist_id: Uuid) -> Result<Option<i32>, AppError> {
        let (max,): (Option<i32>,) = self
            .timed(
                "max_playlist_position",
                sqlx::query_as("SELECT MAX(position) FROM playlist_videos WHERE playlist_id = $1")
                    .bind(playlist_id)
                    .fetch_one(&self.pool),
            )
            .await?;
        Ok(max)
    }

    async fn insert_playlist_video(&self, entry: NewPlaylistVideo) -> Result<PlaylistVideo, AppError> {
        self.timed(
            "insert_playlist_video",
            sqlx::query_as::<_, PlaylistVideo>(
                r#"INSERT INTO playlist_videos (playlist_id, video_id, position, added_by, notes)
                   VALUES ($1, $2, $3, $4, $5)
                   RETURNING id, playlist_id, video_id, position, added_by, notes, created_at"#,
            )
            .bind(entry.playlist_id)
            .bind(entry.video_id)
            .bind(entry.position)
            .bind(entry.added_by)
            .bind(&entry.notes)
            .fetch_one(&self.pool),
        )
        .await
    }

    async fn delete_playlist_video(&self, playlist_id: Uuid, video_id: Uuid) -> Result<(), AppError> {
        self.timed(
            "delete_playlist_video",
            sqlx::query("DELETE FROM playlist_videos WHERE playlist_id = $1 AND video_id = $2")
                .bind(playlist_id)
                .bind(video_id)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn set_playlist_video_position(
        &self,
        playlist_id: Uuid,
        video_id: Uuid,
        position: i32,
    ) -> Result<(), AppError> {
        self.timed(
            "set_playlist_video_position",
            sqlx::query("UPDATE playlist_videos SET position = $3 WHERE playlist_id = $1 AND video_id = $2")
                .bind(playlist_id)
                .bind(video_id)
                .bind(position)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn list_collaborators(&self, playlist_id: Uuid) -> Result<Vec<CollaboratorView>, AppError> {
        let rows = self
            .timed(
                "list_collaborators",
                sqlx::query_as::<_, CollaboratorRow>(
                    r#"SELECT pc.id, pc.playlist_id, pc.user_id, pc.role::text AS role, pc.invited_at,
                              pr.username, pr.display_name, pr.avatar_url,
                              (pr.id IS NOT NULL) AS has_profile
                       FROM playlist_collaborators pc
                       LEFT JOIN profiles pr ON pr.id = pc.user_id
                       WHERE pc.playlist_id = $1
                       ORDER BY pc.invited_at ASC"#,
                )
                .bind(playlist_id)
                .fetch_all(&self.pool),
            )
            .await?;
        Ok(rows.into_iter().map(CollaboratorView::from).collect())
    }

    async fn collaborating_playlist_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let rows: Vec<(Uuid,)> = self
            .timed(
                "collaborating_playlist_ids",
                sqlx::query_as("SELECT playlist_id FROM playlist_collaborators WHERE user_id = $1")
                    .bind(user_id)
                    .fetch_all(&self.pool),
            )
            .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn insert_collaborator(
        &self,
        playlist_id: Uuid,
        user_id: Uuid,
        role: RoleId,
    ) -> Result<PlaylistCollaborator, AppError> {
        self.timed(
            "insert_collaborator",
            sqlx::query_as::<_, PlaylistCollaborator>(
                r#"INSERT INTO playlist_collaborators (playlist_id, user_id, role)
                   VALUES ($1, $2, $3)
                   RETURNING id, playlist_id, user_id, role::text AS role, invited_at"#,
            )
            .bind(playlist_id)
            .bind(user_id)
            .bind(role.as_str())
            .fetch_one(&self.pool),
        )
        .await
    }

    async fn update_collaborator_role(&self, playlist_id: Uuid, user_id: Uuid, role: RoleId) -> Result<(), AppError> {
        self.timed(
            "update_collaborator_role",
            sqlx::query("UPDATE playlist_collaborators SET role = $3 WHERE playlist_id = $1 AND user_id = $2")
                .bind(playlist_id)
                .bind(user_id)
                .bind(role.as_str())
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn delete_collaborator(&self, playlist_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        self.timed(
            "delete_collaborator",
            sqlx::query("DELETE FROM playlist_collaborators WHERE playlist_id = $1 AND user_id = $2")
                .bind(playlist_id)
                .bind(user_id)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn list_progress(&self, playlist_id: Uuid, user_id: Uuid) -> Result<Vec<PlaylistProgress>, AppError> {
        let sql = format!(
            "SELECT {} FROM playlist_progress WHERE playlist_id = $1 AND user_id = $2",
            PROGRESS_COLUMNS
        );
        self.timed(
            "list_progress",
            sqlx::query_as::<_, PlaylistProgress>(&sql)
                .bind(playlist_id)
                .bind(user_id)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn upsert_progress(&self, entry: ProgressUpsert) -> Result<PlaylistProgress, AppError> {
        let watched_at: Option<DateTime<Utc>> = entry.watched_at(Utc::now());
        let sql = format!(
            r#"INSERT INTO playlist_progress (playlist_id, user_id, video_id, watched, watched_at, last_position_seconds)
               VALUES ($1, $2, $3, $4, $5, $6)
               ON CONFLICT (playlist_id, user_id, video_id) DO UPDATE SET
                 watched = EXCLUDED.watched,
                 watched_at = EXCLUDED.watched_at,
                 last_position_seconds = EXCLUDED.last_position_seconds,
                 updated_at = NOW()
               RETURNING {}"#,
            PROGRESS_COLUMNS
        );
        self.timed(
            "upsert_progress",
            sqlx::query_as::<_, PlaylistProgress>(&sql)
                .bind(entry.playlist_id)
                .bind(entry.user_id)
                .bind(entry.video_id)
                .bind(entry.watched)
                .bind(watched_at)
                .bind(entry.last_position_seconds)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, AppError> {
        let sql = format!("SELECT {} FROM profiles WHERE id = $1", PROFILE_COLUMNS);
        self.timed(
            "get_profile",
            sqlx::query_as::<_, Profile>(&sql).bind(id).fetch_optional(&self.pool),
        )
        .await
    }

    async fn get_profile_by_username(&self, username: &str) -> Result<Option<Profile>, AppError> {
        let sql = format!("SELECT {} FROM profiles WHERE username = $1", PROFILE_COLUMNS);
        self.timed(
            "get_profile_by_username",
            sqlx::query_as::<_, Profile>(&sql)
                .bind(username)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> Result<Profile, AppError> {
        // An empty username clears the column.
        let clear_username = changes.username.as_deref() == Some("");
        let sql = format!(
            r#"UPDATE profiles SET
                 username = CASE WHEN $6 THEN NULL ELSE COALESCE($2, username) END,
                 display_name = COALESCE($3, display_name),
                 avatar_url = COALESCE($4, avatar_url),
                 bio = COALESCE($5, bio),
                 updated_at = NOW()
               WHERE id = $1
               RETURNING {}"#,
            PROFILE_COLUMNS
        );
        let updated = self
            .timed(
                "update_profile",
                sqlx::query_as::<_, Profile>(&sql)
                    .bind(id)
                    .bind(&changes.username)
                    .bind(&changes.display_name)
                    .bind(&changes.avatar_url)
                    .bind(&changes.bio)
                    .bind(clear_username)
                    .fetch_optional(&self.pool),
            )
            .await?;
        updated.ok_or_else(|| AppError::NotFound(format!("Profile {} not found", id)))
    }

    async fn list_social_accounts(&self, user_id: Uuid) -> Result<Vec<UserSocialAccount>, AppError> {
        let sql = format!(
            "SELECT {} FROM user_social_accounts WHERE user_id = $1 ORDER BY created_at ASC",
            SOCIAL_COLUMNS
        );
        self.timed(
            "list_social_accounts",
            sqlx::query_as::<_, UserSocialAccount>(&sql)
                .bind(user_id)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn get_social_account(&self, id: Uuid) -> Result<Option<UserSocialAccount>, AppError> {
        let sql = format!("SELECT {} FROM user_social_accounts WHERE id = $1", SOCIAL_COLUMNS);
        self.timed(
            "get_social_account",
            sqlx::query_as::<_, UserSocialAccount>(&sql)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn insert_social_account(
        &self,
        user_id: Uuid,
        account: NewSocialAccount,
    ) -> Result<UserSocialAccount, AppError> {
        let sql = format!(
            "INSERT INTO user_social_accounts (user_id, platform, url) VALUES ($1, $2, $3) RETURNING {}",
            SOCIAL_COLUMNS
        );
        self.timed(
            "insert_social_account",
            sqlx::query_as::<_, UserSocialAccount>(&sql)
                .bind(user_id)
                .bind(&account.platform)
                .bind(&account.url)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn update_social_account(
        &self,
        id: Uuid,
        changes: SocialAccountChanges,
    ) -> Result<UserSocialAccount, AppError> {
        let sql = format!(
            r#"UPDATE user_social_accounts SET
                 platform = COALESCE($2, platform),
                 url = COALESCE($3, url),
                 updated_at = NOW()
               WHERE id = $1
               RETURNING {}"#,
            SOCIAL_COLUMNS
        );
        let updated = self
            .timed(
                "update_social_account",
                sqlx::query_as::<_, UserSocialAccount>(&sql)
                    .bind(id)
                    .bind(&changes.platform)
                    .bind(&changes.url)
                    .fetch_optional(&self.pool),
            )
            .await?;
        updated.ok_or_else(|| AppError::NotFound(format!("Social account {} not found", id)))
    }

    async fn delete_social_account(&self, id: Uuid) -> Result<(), AppError> {
        self.timed(
            "delete_social_account",
            sqlx::query("DELETE FROM user_social_accounts WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slow_queries_time_out_as_gateway_timeout() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://videoteca@localhost/videoteca")
            .unwrap();
        let store = PgStore {
            pool,
            timeout: Duration::from_millis(10),
        };

        let result = store
            .timed("stalled_query", std::future::pending::<Result<i64, sqlx::Error>>())
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, AppError::Timeout(_)));
        assert_eq!(err.status(), axum::http::StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("100%_done"), "%100\\%\\_done%");
        assert_eq!(like_pattern("rust"), "%rust%");
    }
}
