//! Who may see or change a playlist.
//!
//! The author can do everything. Collaborators with the editor role can edit
//! the playlist and its videos; viewers can only see it. Private playlists
//! are hidden from everyone else.

use uuid::Uuid;

use crate::{
    api::common::{cache::QueryCache, keys},
    entities::{collaborator::CollaboratorView, playlist::PlaylistView},
    errors::AppError,
    flyweights::role::RoleId,
    store::Store,
};

pub async fn load_playlist(store: &dyn Store, cache: &QueryCache, id: Uuid) -> Result<PlaylistView, AppError> {
    cache
        .get_or_load(&keys::playlist(id), || async move {
            store
                .get_playlist(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Playlist {} not found", id)))
        })
        .await
}

pub async fn load_collaborators(
    store: &dyn Store,
    cache: &QueryCache,
    id: Uuid,
) -> Result<Vec<CollaboratorView>, AppError> {
    cache
        .get_or_load(&keys::playlist_collaborators(id), || async move {
            store.list_collaborators(id).await
        })
        .await
}

pub fn is_author(playlist: &PlaylistView, user_id: Uuid) -> bool {
    playlist.playlist.author_id == user_id
}

fn role_of(collaborators: &[CollaboratorView], user_id: Uuid) -> Option<RoleId> {
    collaborators
        .iter()
        .find(|c| c.collaborator.user_id == user_id)
        .map(|c| c.collaborator.role)
}

pub async fn can_edit(
    store: &dyn Store,
    cache: &QueryCache,
    playlist: &PlaylistView,
    user_id: Uuid,
) -> Result<bool, AppError> {
    if is_author(playlist, user_id) {
        return Ok(true);
    }
    let collaborators = load_collaborators(store, cache, playlist.playlist.id).await?;
    Ok(role_of(&collaborators, user_id) == Some(RoleId::Editor))
}

pub async fn can_view(
    store: &dyn Store,
    cache: &QueryCache,
    playlist: &PlaylistView,
    user_id: Option<Uuid>,
) -> Result<bool, AppError> {
    if playlist.playlist.is_public {
        return Ok(true);
    }
    let Some(user_id) = user_id else {
        return Ok(false);
    };
    if is_author(playlist, user_id) {
        return Ok(true);
    }
    let collaborators = load_collaborators(store, cache, playlist.playlist.id).await?;
    Ok(role_of(&collaborators, user_id).is_some())
}

/// Loads the playlist; a private one the caller may not see is reported as missing.
pub async fn visible_playlist(
    store: &dyn Store,
    cache: &QueryCache,
    id: Uuid,
    user_id: Option<Uuid>,
) -> Result<PlaylistView, AppError> {
    let playlist = load_playlist(store, cache, id).await?;
    if can_view(store, cache, &playlist, user_id).await? {
        Ok(playlist)
    } else {
        Err(AppError::NotFound(format!("Playlist {} not found", id)))
    }
}

pub async fn editable_playlist(
    store: &dyn Store,
    cache: &QueryCache,
    id: Uuid,
    user_id: Uuid,
) -> Result<PlaylistView, AppError> {
    let playlist = load_playlist(store, cache, id).await?;
    if can_edit(store, cache, &playlist, user_id).await? {
        Ok(playlist)
    } else {
        tracing::warn!(playlist_id = %id, user_id = %user_id, "Edit denied");
        Err(AppError::Permission(anyhow::anyhow!(
            "You don't have permission to edit this playlist"
        )))
    }
}

pub async fn authored_playlist(
    store: &dyn Store,
    cache: &QueryCache,
    id: Uuid,
    user_id: Uuid,
) -> Result<PlaylistView, AppError> {
    let playlist = load_playlist(store, cache, id).await?;
    if is_author(&playlist, user_id) {
        Ok(playlist)
    } else {
        tracing::warn!(playlist_id = %id, user_id = %user_id, "Author-only action denied");
        Err(AppError::Permission(anyhow::anyhow!(
            "Only the playlist author can do this"
        )))
    }
}
