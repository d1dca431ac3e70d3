//! Version 1 of the catalog API.
//!
//! Read endpoints are public and only look at the caller when a valid token
//! is present. Anything that writes goes through [`auth_middleware`].

pub mod access;
pub mod accounts;
pub mod categories;
pub mod collaborators;
pub mod descriptors;
pub mod localization;
pub mod playlist_videos;
pub mod playlists;
pub mod profiles;
pub mod progress;
pub mod social_accounts;
pub mod videos;

use axum::routing::{delete, get, post, put};
use axum::{middleware, Router};

use crate::api::common::middleware::{auth_middleware, optional_auth_middleware};
use crate::InnerState;

#[tracing::instrument(name = "create_v1_router", skip(state))]
pub fn create_v1_router(state: InnerState) -> Router<InnerState> {
    tracing::info!("Creating V1 API router");

    let public = Router::new()
        .route("/api/v1/videos", get(videos::list_videos))
        .route("/api/v1/videos/:id", get(videos::get_video))
        .route("/api/v1/videos/:id/view", post(videos::increment_view))
        .route("/api/v1/stats/videos", get(videos::video_count))
        .route("/api/v1/stats/contributors", get(videos::contributor_count))

        .route("/api/v1/categories", get(categories::list_categories))
        .route("/api/v1/categories/:id", get(categories::get_category))

        .route("/api/v1/playlists", get(playlists::list_playlists))
        .route("/api/v1/playlists/:id", get(playlists::get_playlist))
        .route("/api/v1/playlists/:id/videos", get(playlist_videos::list_playlist_videos))
        .route("/api/v1/playlists/:id/collaborators", get(collaborators::list_collaborators))

        .route("/api/v1/profiles/:id", get(profiles::get_profile))
        .route("/api/v1/profiles/by-username/:username", get(profiles::get_profile_by_username))
        .route("/api/v1/profiles/:id/social-accounts", get(social_accounts::list_social_accounts))

        .route("/api/v1/i18n/:lang", get(localization::translations))
        .route("/api/v1/i18n/:lang/:key", get(localization::translate))
        .route("/api/v1/languages", get(localization::supported_languages))
        .route(
            "/api/v1/language",
            get(localization::current_language).put(localization::change_language),
        )

        .route("/api/v1/sign-up/validate", post(accounts::validate_sign_up))

        .route("/api/v1/icons/:name", get(descriptors::get_icon))
        .route("/api/v1/roles/:id", get(descriptors::get_role))
        .route("/api/v1/styles/:id", get(descriptors::get_style))
        .layer(middleware::from_fn_with_state(state.clone(), optional_auth_middleware));

    let protected = Router::new()
        .route("/api/v1/videos", post(videos::submit_video))

        .route("/api/v1/me/playlists", get(playlists::my_playlists))
        .route("/api/v1/playlists", post(playlists::create_playlist))
        .route("/api/v1/playlists/:id", put(playlists::update_playlist))
        .route("/api/v1/playlists/:id", delete(playlists::delete_playlist))
        .route("/api/v1/playlists/:id/videos", post(playlist_videos::add_video))
        .route("/api/v1/playlists/:id/videos/order", put(playlist_videos::reorder_videos))
        .route("/api/v1/playlists/:id/videos/:video_id", delete(playlist_videos::remove_video))
        .route("/api/v1/playlists/:id/collaborators", post(collaborators::add_collaborator))
        .route(
            "/api/v1/playlists/:id/collaborators/:user_id",
            put(collaborators::update_collaborator_role).delete(collaborators::remove_collaborator),
        )
        .route("/api/v1/playlists/:id/progress", get(progress::my_progress))
        .route("/api/v1/playlists/:id/progress/:video_id", put(progress::mark_watched))

        .route(
            "/api/v1/me/profile",
            get(profiles::my_profile).put(profiles::update_my_profile),
        )
        .route("/api/v1/me/social-accounts", post(social_accounts::create_social_account))
        .route(
            "/api/v1/me/social-accounts/:id",
            put(social_accounts::update_social_account).delete(social_accounts::delete_social_account),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    public.merge(protected).with_state(state)
}
