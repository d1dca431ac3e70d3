use axum::{
    extract::{Path, State},
    Extension, Json,
};
use futures::future::join_all;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::{
        common::{keys, middleware::AuthUser, ApiResponse},
        v1::access,
    },
    entities::playlist_video::{NewPlaylistVideo, PlaylistVideo, PlaylistVideoView},
    errors::AppError,
    store::Store,
    InnerState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddVideo {
    pub video_id: Uuid,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderVideos {
    /// Every video of the playlist, in the new order.
    pub video_ids: Vec<Uuid>,
}

fn entry_keys(playlist_id: Uuid) -> [String; 3] {
    [
        keys::playlist_videos(playlist_id),
        keys::playlist(playlist_id),
        keys::PLAYLISTS.to_string(),
    ]
}

#[tracing::instrument(name = "List playlist videos", skip(inner, user), fields(playlist_id = %id))]
pub async fn list_playlist_videos(
    State(inner): State<InnerState>,
    user: Option<Extension<AuthUser>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<PlaylistVideoView>>>, AppError> {
    let InnerState { store, cache, .. } = inner;
    let viewer = user.map(|Extension(u)| u.id);
    access::visible_playlist(store.as_ref(), &cache, id, viewer).await?;

    let entries = cache
        .get_or_load(&keys::playlist_videos(id), || async move {
            store.list_playlist_videos(id).await
        })
        .await?;
    Ok(Json(ApiResponse::success(entries)))
}

/// Appends the video after the current last position (0 for an empty playlist).
#[tracing::instrument(name = "Add video to playlist", skip(inner, user, payload), fields(playlist_id = %id, user_id = %user.id))]
pub async fn add_video(
    State(inner): State<InnerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddVideo>,
) -> Result<Json<ApiResponse<PlaylistVideo>>, AppError> {
    let InnerState { store, cache, .. } = inner;
    access::editable_playlist(store.as_ref(), &cache, id, user.id).await?;

    if store.get_video(payload.video_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Video {} not found", payload.video_id)));
    }

    let position = store
        .max_playlist_position(id)
        .await?
        .map_or(0, |max| max + 1);

    let entry = store
        .insert_playlist_video(NewPlaylistVideo {
            playlist_id: id,
            video_id: payload.video_id,
            position,
            added_by: Some(user.id),
            notes: payload.notes,
        })
        .await?;

    tracing::info!(video_id = %entry.video_id, position, "Video added to playlist");
    cache.invalidate(entry_keys(id));
    Ok(Json(ApiResponse::success(entry).with_message("Video added to playlist!")))
}

#[tracing::instrument(name = "Remove video from playlist", skip(inner, user), fields(playlist_id = %id, user_id = %user.id))]
pub async fn remove_video(
    State(inner): State<InnerState>,
    Extension(user): Extension<AuthUser>,
    Path((id, video_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<Uuid>>, AppError> {
    let InnerState { store, cache, .. } = inner;
    access::editable_playlist(store.as_ref(), &cache, id, user.id).await?;

    store.delete_playlist_video(id, video_id).await?;

    cache.invalidate(entry_keys(id));
    Ok(Json(ApiResponse::success(video_id).with_message("Video removed from playlist!")))
}

/// Writes `index` as the position of each listed video. The updates run
/// concurrently; every failure is reported in one error.
pub async fn apply_order(store: &dyn Store, playlist_id: Uuid, video_ids: &[Uuid]) -> Result<(), AppError> {
    let updates = video_ids
        .iter()
        .enumerate()
        .map(|(index, video_id)| store.set_playlist_video_position(playlist_id, *video_id, index as i32));

    let failures: Vec<String> = join_all(updates)
        .await
        .into_iter()
        .zip(video_ids)
        .filter_map(|(result, video_id)| result.err().map(|e| format!("{}: {}", video_id, e)))
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        tracing::error!("Reorder failed for {} videos", failures.len());
        Err(AppError::Database(anyhow::anyhow!(
            "Failed to reorder playlist: {}",
            failures.join("; ")
        )))
    }
}

#[tracing::instrument(name = "Reorder playlist", skip(inner, user, payload), fields(playlist_id = %id, user_id = %user.id))]
pub async fn reorder_videos(
    State(inner): State<InnerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReorderVideos>,
) -> Result<Json<ApiResponse<Vec<PlaylistVideoView>>>, AppError> {
    let InnerState { store, cache, .. } = inner;
    access::editable_playlist(store.as_ref(), &cache, id, user.id).await?;

    let outcome = apply_order(store.as_ref(), id, &payload.video_ids).await;
    // Some rows may have moved even when others failed.
    cache.invalidate([keys::playlist_videos(id)]);
    outcome?;

    let entries = store.list_playlist_videos(id).await?;
    Ok(Json(ApiResponse::success(entries).with_message("Playlist reordered successfully!")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    #[tokio::test]
    async fn reorder_assigns_positions_by_index() {
        let store = MemoryStore::new();
        let playlist = Uuid::new_v4();
        let (v1, v2, v3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        for (position, video_id) in [v1, v2, v3].into_iter().enumerate() {
            store
                .insert_playlist_video(NewPlaylistVideo {
                    playlist_id: playlist,
                    video_id,
                    position: position as i32,
                    added_by: None,
                    notes: None,
                })
                .await
                .unwrap();
        }

        apply_order(&store, playlist, &[v3, v1, v2]).await.unwrap();

        let order: Vec<(Uuid, i32)> = store
            .list_playlist_videos(playlist)
            .await
            .unwrap()
            .into_iter()
            .map(|view| (view.entry.video_id, view.entry.position))
            .collect();
        assert_eq!(order, vec![(v3, 0), (v1, 1), (v2, 2)]);
    }

    #[tokio::test]
    async fn reorder_failures_are_aggregated() {
        let store = MemoryStore::new();
        store.set_unavailable(true);

        let err = apply_order(&store, Uuid::new_v4(), &[Uuid::new_v4(), Uuid::new_v4()])
            .await
            .unwrap_err();

        match err {
            AppError::Database(e) => assert_eq!(e.to_string().matches("unavailable").count(), 2),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
