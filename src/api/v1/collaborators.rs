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
    entities::collaborator::{CollaboratorView, PlaylistCollaborator},
    errors::AppError,
    flyweights::role::RoleId,
    InnerState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCollaborator {
    pub user_id: Uuid,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRole {
    pub role: String,
}

/// Parses a role a collaborator may hold; `owner` belongs to the author only.
fn collaborator_role(raw: &str) -> Result<RoleId, AppError> {
    let role: RoleId = raw.parse()?;
    if role.is_collaborator_role() {
        Ok(role)
    } else {
        Err(AppError::Validation(format!(
            "Collaborators can be editors or viewers, not {}",
            role
        )))
    }
}

#[tracing::instrument(name = "List collaborators", skip(inner, user), fields(playlist_id = %id))]
pub async fn list_collaborators(
    State(inner): State<InnerState>,
    user: Option<Extension<AuthUser>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<CollaboratorView>>>, AppError> {
    let viewer = user.map(|Extension(u)| u.id);
    access::visible_playlist(inner.store.as_ref(), &inner.cache, id, viewer).await?;

    let collaborators = access::load_collaborators(inner.store.as_ref(), &inner.cache, id).await?;
    Ok(Json(ApiResponse::success(collaborators)))
}

#[tracing::instrument(name = "Add collaborator", skip(inner, user, payload), fields(playlist_id = %id, user_id = %user.id))]
pub async fn add_collaborator(
    State(inner): State<InnerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddCollaborator>,
) -> Result<Json<ApiResponse<PlaylistCollaborator>>, AppError> {
    let InnerState { store, cache, .. } = inner;
    let role = match payload.role.as_deref() {
        Some(raw) => collaborator_role(raw)?,
        None => RoleId::Editor,
    };

    let playlist = access::authored_playlist(store.as_ref(), &cache, id, user.id).await?;
    if playlist.playlist.author_id == payload.user_id {
        return Err(AppError::Validation(
            "The author is already the owner of this playlist".to_string(),
        ));
    }
    if store.get_profile(payload.user_id).await?.is_none() {
        return Err(AppError::NotFound(format!("User {} not found", payload.user_id)));
    }

    let collaborator = store.insert_collaborator(id, payload.user_id, role).await?;

    tracing::info!(collaborator_id = %payload.user_id, %role, "Collaborator added");
    cache.invalidate([keys::playlist_collaborators(id), keys::PLAYLISTS.to_string()]);
    Ok(Json(ApiResponse::success(collaborator).with_message("Collaborator added!")))
}

#[tracing::instrument(name = "Update collaborator role", skip(inner, user, payload), fields(playlist_id = %id, user_id = %user.id))]
pub async fn update_collaborator_role(
    State(inner): State<InnerState>,
    Extension(user): Extension<AuthUser>,
    Path((id, collaborator_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateRole>,
) -> Result<Json<ApiResponse<RoleId>>, AppError> {
    let InnerState { store, cache, .. } = inner;
    let role = collaborator_role(&payload.role)?;
    access::authored_playlist(store.as_ref(), &cache, id, user.id).await?;

    store.update_collaborator_role(id, collaborator_id, role).await?;

    cache.invalidate([keys::playlist_collaborators(id)]);
    Ok(Json(ApiResponse::success(role).with_message("Collaborator role updated!")))
}

#[tracing::instrument(name = "Remove collaborator", skip(inner, user), fields(playlist_id = %id, user_id = %user.id))]
pub async fn remove_collaborator(
    State(inner): State<InnerState>,
    Extension(user): Extension<AuthUser>,
    Path((id, collaborator_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<Uuid>>, AppError> {
    let InnerState { store, cache, .. } = inner;
    access::authored_playlist(store.as_ref(), &cache, id, user.id).await?;

    store.delete_collaborator(id, collaborator_id).await?;

    cache.invalidate([keys::playlist_collaborators(id), keys::PLAYLISTS.to_string()]);
    Ok(Json(ApiResponse::success(collaborator_id).with_message("Collaborator removed!")))
}
