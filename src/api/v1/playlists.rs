use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::{
    api::{
        common::{
            keys,
            middleware::AuthUser,
            validation::{validate_new_playlist, validate_playlist_changes},
            ApiResponse,
        },
        v1::access,
    },
    entities::playlist::{
        NewPlaylist, Playlist, PlaylistChanges, PlaylistListParams, PlaylistQuery, PlaylistScope, PlaylistView,
    },
    errors::AppError,
    InnerState,
};

/// Public listing. Private playlists never show up here, whatever `isPublic` says.
#[tracing::instrument(name = "List playlists", skip(inner))]
pub async fn list_playlists(
    State(inner): State<InnerState>,
    Query(params): Query<PlaylistListParams>,
) -> Result<Json<ApiResponse<Vec<PlaylistView>>>, AppError> {
    let InnerState { store, cache, .. } = inner;

    let query = PlaylistQuery {
        author_id: params.author_id,
        is_public: Some(true),
        search: params.search.clone(),
    };
    let playlists = cache
        .get_or_load(&keys::playlists(&params), || async move { store.list_playlists(&query).await })
        .await?;

    Ok(Json(ApiResponse::success(playlists)))
}

/// Playlists the caller authored, collaborates on, or both.
#[tracing::instrument(name = "List my playlists", skip(inner, user), fields(user_id = %user.id))]
pub async fn my_playlists(
    State(inner): State<InnerState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<PlaylistListParams>,
) -> Result<Json<ApiResponse<Vec<PlaylistView>>>, AppError> {
    let InnerState { store, cache, .. } = inner;
    let key = keys::user_playlists(&params, user.id);
    let scope = params.filter;

    let playlists = cache
        .get_or_load(&key, || async move {
            let base = PlaylistQuery {
                author_id: None,
                is_public: params.is_public,
                search: params.search.clone(),
            };

            let mut playlists = Vec::new();
            if matches!(params.filter, PlaylistScope::All | PlaylistScope::My) {
                let own = PlaylistQuery {
                    author_id: Some(user.id),
                    ..base.clone()
                };
                playlists.extend(store.list_playlists(&own).await?);
            }

            if matches!(params.filter, PlaylistScope::All | PlaylistScope::Collaborating) {
                let ids: HashSet<Uuid> = store.collaborating_playlist_ids(user.id).await?.into_iter().collect();
                if !ids.is_empty() {
                    let shared = store.list_playlists(&base).await?;
                    playlists.extend(
                        shared
                            .into_iter()
                            .filter(|p| ids.contains(&p.playlist.id) && p.playlist.author_id != user.id),
                    );
                }
            }

            playlists.sort_by(|a, b| b.playlist.created_at.cmp(&a.playlist.created_at));
            Ok(playlists)
        })
        .await?;

    tracing::debug!("Found {} playlists for {:?}", playlists.len(), scope);
    Ok(Json(ApiResponse::success(playlists)))
}

#[tracing::instrument(name = "Get playlist", skip(inner, user), fields(playlist_id = %id))]
pub async fn get_playlist(
    State(inner): State<InnerState>,
    user: Option<Extension<AuthUser>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PlaylistView>>, AppError> {
    let viewer = user.map(|Extension(u)| u.id);
    let playlist = access::visible_playlist(inner.store.as_ref(), &inner.cache, id, viewer).await?;
    Ok(Json(ApiResponse::success(playlist)))
}

#[tracing::instrument(name = "Create playlist", skip(inner, user, payload), fields(user_id = %user.id))]
pub async fn create_playlist(
    State(inner): State<InnerState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<NewPlaylist>,
) -> Result<Json<ApiResponse<Playlist>>, AppError> {
    validate_new_playlist(&payload)?;

    let playlist = inner.store.insert_playlist(user.id, payload).await?;

    tracing::info!(playlist_id = %playlist.id, "Playlist created");
    inner.cache.invalidate([keys::PLAYLISTS]);
    Ok(Json(ApiResponse::success(playlist).with_message("Playlist created!")))
}

#[tracing::instrument(name = "Update playlist", skip(inner, user, changes), fields(playlist_id = %id, user_id = %user.id))]
pub async fn update_playlist(
    State(inner): State<InnerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(changes): Json<PlaylistChanges>,
) -> Result<Json<ApiResponse<Playlist>>, AppError> {
    validate_playlist_changes(&changes)?;
    access::editable_playlist(inner.store.as_ref(), &inner.cache, id, user.id).await?;

    let playlist = inner.store.update_playlist(id, changes).await?;

    inner.cache.invalidate([keys::PLAYLISTS.to_string(), keys::playlist(id)]);
    Ok(Json(ApiResponse::success(playlist).with_message("Playlist updated!")))
}

#[tracing::instrument(name = "Delete playlist", skip(inner, user), fields(playlist_id = %id, user_id = %user.id))]
pub async fn delete_playlist(
    State(inner): State<InnerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Uuid>>, AppError> {
    access::authored_playlist(inner.store.as_ref(), &inner.cache, id, user.id).await?;

    inner.store.delete_playlist(id).await?;

    tracing::info!("Playlist deleted");
    inner.cache.invalidate([
        keys::PLAYLISTS.to_string(),
        keys::playlist(id),
        keys::playlist_videos(id),
        keys::playlist_collaborators(id),
        format!("{}:{}", keys::PLAYLIST_PROGRESS, id),
    ]);
    Ok(Json(ApiResponse::success(id).with_message("Playlist deleted!")))
}
