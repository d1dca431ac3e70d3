use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::common::{
        keys,
        middleware::AuthUser,
        validation::{FieldErrors, INVALID_LANGUAGE, INVALID_VIDEO_URL},
        youtube::{extract_youtube_id, thumbnail_url, ThumbnailQuality},
        ApiResponse,
    },
    entities::video::{NewVideo, Video, VideoFilters},
    errors::AppError,
    flyweights::language,
    InnerState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitVideo {
    /// Any YouTube URL shape, or the bare id.
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub channel_name: String,
    pub duration_seconds: Option<i32>,
    pub language: Option<String>,
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ViewCount {
    pub id: Uuid,
    pub view_count: i32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Count {
    pub count: i64,
}

#[tracing::instrument(name = "List videos", skip(inner))]
pub async fn list_videos(
    State(inner): State<InnerState>,
    Query(filters): Query<VideoFilters>,
) -> Result<Json<ApiResponse<Vec<Video>>>, AppError> {
    let InnerState { store, cache, .. } = inner;

    let videos = cache
        .get_or_load(&keys::videos(&filters), || async move {
            store.list_videos(&filters).await
        })
        .await?;

    tracing::debug!("Returning {} videos", videos.len());
    Ok(Json(ApiResponse::success(videos)))
}

#[tracing::instrument(name = "Get video", skip(inner), fields(video_id = %id))]
pub async fn get_video(
    State(inner): State<InnerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Video>>, AppError> {
    let InnerState { store, cache, .. } = inner;

    let video = cache
        .get_or_load(&keys::video(id), || async move {
            store
                .get_video(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))
        })
        .await?;

    Ok(Json(ApiResponse::success(video)))
}

#[tracing::instrument(name = "Submit video", skip(inner, user, payload), fields(user_id = %user.id))]
pub async fn submit_video(
    State(inner): State<InnerState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<SubmitVideo>,
) -> Result<Json<ApiResponse<Video>>, AppError> {
    let youtube_id = extract_youtube_id(&payload.url);
    let language = payload
        .language
        .unwrap_or_else(|| language::DEFAULT_LANGUAGE.to_string());

    let mut errors = FieldErrors::default();
    errors.check(youtube_id.is_some(), "url", INVALID_VIDEO_URL);
    errors.check(language::is_registered(&language), "language", INVALID_LANGUAGE);
    errors.check(!payload.title.trim().is_empty(), "title", "video.error.titleRequired");
    errors.into_result()?;

    let Some(youtube_id) = youtube_id else {
        return Err(AppError::Validation(INVALID_VIDEO_URL.to_string()));
    };

    let video = inner
        .store
        .insert_video(NewVideo {
            thumbnail_url: thumbnail_url(&youtube_id, ThumbnailQuality::High),
            youtube_id,
            title: payload.title.trim().to_string(),
            description: payload.description,
            channel_name: payload.channel_name,
            duration_seconds: payload.duration_seconds,
            language,
            category_id: payload.category_id,
            submitted_by: user.id,
        })
        .await?;

    tracing::info!(video_id = %video.id, "Video submitted");
    inner.cache.invalidate([
        keys::VIDEOS.to_string(),
        keys::VIDEO_COUNT.to_string(),
        keys::profile(user.id),
        keys::PROFILE_BY_USERNAME.to_string(),
    ]);

    Ok(Json(ApiResponse::success(video).with_message("Video submitted!")))
}

/// Answers with the optimistic count right away. The increment runs on a
/// detached task and its failure is only logged.
#[tracing::instrument(name = "Increment view count", skip(inner), fields(video_id = %id))]
pub async fn increment_view(
    State(inner): State<InnerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ViewCount>>, AppError> {
    let InnerState { store, cache, .. } = inner;
    let key = keys::video(id);

    let current = match cache.get_json::<Video>(&key) {
        Some(video) => video.view_count,
        None => {
            store
                .get_video(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?
                .view_count
        }
    };
    let optimistic = current + 1;

    cache.patch_json::<Video, _>(&key, |video| video.view_count = optimistic);

    tokio::spawn(async move {
        match store.increment_view_count(id).await {
            Ok(count) => tracing::debug!(video_id = %id, count, "View count incremented"),
            Err(e) => tracing::debug!(video_id = %id, "View count increment failed: {}", e),
        }
    });

    Ok(Json(ApiResponse::success(ViewCount {
        id,
        view_count: optimistic,
    })))
}

#[tracing::instrument(name = "Count videos", skip(inner))]
pub async fn video_count(State(inner): State<InnerState>) -> Result<Json<ApiResponse<Count>>, AppError> {
    let InnerState { store, cache, .. } = inner;
    let count = cache
        .get_or_load(keys::VIDEO_COUNT, || async move { store.count_videos().await })
        .await?;
    Ok(Json(ApiResponse::success(Count { count })))
}

#[tracing::instrument(name = "Count contributors", skip(inner))]
pub async fn contributor_count(State(inner): State<InnerState>) -> Result<Json<ApiResponse<Count>>, AppError> {
    let InnerState { store, cache, .. } = inner;
    let count = cache
        .get_or_load(keys::CONTRIBUTOR_COUNT, || async move { store.count_profiles().await })
        .await?;
    Ok(Json(ApiResponse::success(Count { count })))
}
