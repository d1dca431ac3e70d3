use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::{
    api::common::{keys, middleware::AuthUser, validation::validate_profile_changes, ApiResponse},
    entities::profile::{Profile, ProfileChanges},
    errors::AppError,
    InnerState,
};

#[tracing::instrument(name = "Get profile", skip(inner), fields(profile_id = %id))]
pub async fn get_profile(
    State(inner): State<InnerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Profile>>, AppError> {
    let InnerState { store, cache, .. } = inner;
    let profile = cache
        .get_or_load(&keys::profile(id), || async move {
            store
                .get_profile(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", id)))
        })
        .await?;
    Ok(Json(ApiResponse::success(profile)))
}

#[tracing::instrument(name = "Get profile by username", skip(inner))]
pub async fn get_profile_by_username(
    State(inner): State<InnerState>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<Profile>>, AppError> {
    let InnerState { store, cache, .. } = inner;
    let key = keys::profile_by_username(&username);
    let profile = cache
        .get_or_load(&key, || async move {
            store
                .get_profile_by_username(&username)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Profile @{} not found", username)))
        })
        .await?;
    Ok(Json(ApiResponse::success(profile)))
}

#[tracing::instrument(name = "Get my profile", skip(inner, user), fields(user_id = %user.id))]
pub async fn my_profile(
    State(inner): State<InnerState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Profile>>, AppError> {
    get_profile(State(inner), Path(user.id)).await
}

#[tracing::instrument(name = "Update my profile", skip(inner, user, changes), fields(user_id = %user.id))]
pub async fn update_my_profile(
    State(inner): State<InnerState>,
    Extension(user): Extension<AuthUser>,
    Json(changes): Json<ProfileChanges>,
) -> Result<Json<ApiResponse<Profile>>, AppError> {
    validate_profile_changes(&changes)?;
    let changes = ProfileChanges {
        username: changes.username.map(|u| u.trim().to_string()),
        ..changes
    };

    let profile = inner.store.update_profile(user.id, changes).await?;

    // Usernames and avatars are joined onto playlists and collaborator lists.
    inner.cache.invalidate([
        keys::profile(user.id),
        keys::PROFILE_BY_USERNAME.to_string(),
        keys::PLAYLISTS.to_string(),
        keys::PLAYLIST.to_string(),
        keys::PLAYLIST_COLLABORATORS.to_string(),
    ]);
    Ok(Json(ApiResponse::success(profile).with_message("Profile updated!")))
}
