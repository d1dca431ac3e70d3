use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::{
        common::{keys, middleware::AuthUser, ApiResponse},
        v1::access,
    },
    entities::progress::{PlaylistProgress, ProgressUpsert},
    errors::AppError,
    InnerState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkWatched {
    pub watched: bool,
    #[serde(default)]
    pub last_position_seconds: i32,
}

#[tracing::instrument(name = "Get playlist progress", skip(inner, user), fields(playlist_id = %id, user_id = %user.id))]
pub async fn my_progress(
    State(inner): State<InnerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<PlaylistProgress>>>, AppError> {
    let InnerState { store, cache, .. } = inner;
    access::visible_playlist(store.as_ref(), &cache, id, Some(user.id)).await?;

    let progress = cache
        .get_or_load(&keys::playlist_progress(id, user.id), || async move {
            store.list_progress(id, user.id).await
        })
        .await?;
    Ok(Json(ApiResponse::success(progress)))
}

/// Upserts the caller's progress row for one video; calling it again only
/// updates that row.
#[tracing::instrument(name = "Mark video watched", skip(inner, user, payload), fields(playlist_id = %id, user_id = %user.id))]
pub async fn mark_watched(
    State(inner): State<InnerState>,
    Extension(user): Extension<AuthUser>,
    Path((id, video_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<MarkWatched>,
) -> Result<Json<ApiResponse<PlaylistProgress>>, AppError> {
    let InnerState { store, cache, .. } = inner;
    access::visible_playlist(store.as_ref(), &cache, id, Some(user.id)).await?;

    let progress = store
        .upsert_progress(ProgressUpsert {
            playlist_id: id,
            user_id: user.id,
            video_id,
            watched: payload.watched,
            last_position_seconds: payload.last_position_seconds.max(0),
        })
        .await?;

    cache.invalidate([keys::playlist_progress(id, user.id)]);
    let message = if progress.watched {
        "Video marked as watched!"
    } else {
        "Video marked as unwatched!"
    };
    Ok(Json(ApiResponse::success(progress).with_message(message)))
}
