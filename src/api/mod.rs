//! HTTP surface of the service.
//!
//! The versioned API and the system routes share the CORS and cookie layers.
//! Edge functions answer their own preflight requests, so they are merged
//! outside of [`CorsLayer`].

pub mod common;
pub mod v1;

use axum::{body::Body, http::StatusCode, response::IntoResponse, Json, Router};
use tower_cookies::CookieManagerLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::common::tracing as trace_hooks;
use crate::api::common::ApiResponse;
use crate::{functions, system, InnerState};

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error("Route not found".to_string())),
    )
}

#[tracing::instrument(name = "create_app", skip(state))]
pub fn create_app(state: InnerState) -> Router {
    tracing::info!("Creating application router");

    let api = Router::new()
        .merge(v1::create_v1_router(state.clone()))
        .merge(system::create_system_router(state.clone()))
        .fallback(not_found)
        .layer(CookieManagerLayer::new())
        .layer(CorsLayer::permissive());

    Router::new()
        .merge(functions::create_functions_router(state.clone()))
        .merge(api)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace_hooks::make_span::<Body>)
                .on_request(trace_hooks::on_request::<Body>)
                .on_response(trace_hooks::on_response::<Body>)
                .on_failure(trace_hooks::on_failure),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::to_bytes;
    use axum::http::{header, Method, Request};
    use chrono::Utc;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::api::common::middleware::test_support::token_for;
    use crate::entities::category::Category;
    use crate::entities::profile::Profile;
    use crate::store::memory::MemoryStore;
    use crate::store::Store;
    use crate::test_support::{app_with, test_state_with};

    const SECRET: &str = "test-jwt-secret";

    fn profile(id: Uuid, username: &str) -> Profile {
        Profile {
            id,
            username: Some(username.to_string()),
            display_name: None,
            avatar_url: None,
            bio: None,
            submissions_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn request(method: Method, uri: &str, user: Option<Uuid>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token_for(user, SECRET)));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn submit(app: &Router, user: Uuid, youtube_id: &str) -> Uuid {
        let (status, body) = send(
            app,
            request(
                Method::POST,
                "/api/v1/videos",
                Some(user),
                Some(json!({
                    "url": format!("https://www.youtube.com/watch?v={}", youtube_id),
                    "title": "Aula",
                    "channelName": "Canal"
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["data"]["id"].as_str().unwrap().parse().unwrap()
    }

    async fn create_playlist(app: &Router, user: Uuid, slug: &str, is_public: bool) -> Uuid {
        let (status, body) = send(
            app,
            request(
                Method::POST,
                "/api/v1/playlists",
                Some(user),
                Some(json!({ "name": "Cálculo I", "slug": slug, "language": "pt", "isPublic": is_public })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["data"]["id"].as_str().unwrap().parse().unwrap()
    }

    fn setup() -> (Router, Arc<MemoryStore>, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let author = Uuid::new_v4();
        store.insert_profile(profile(author, "author"));
        let app = app_with(test_state_with(store.clone()));
        (app, store, author)
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let (app, _, _) = setup();

        let (status, body) = send(
            &app,
            request(Method::POST, "/api/v1/playlists", None, Some(json!({}))),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn unknown_routes_get_the_api_envelope() {
        let (app, _, _) = setup();

        let (status, body) = send(&app, request(Method::GET, "/api/v1/nope", None, None)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Route not found");
    }

    #[tokio::test]
    async fn invalid_playlist_lists_every_field_error() {
        let (app, _, author) = setup();

        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/api/v1/playlists",
                Some(author),
                Some(json!({ "name": " ", "slug": "Not A Slug", "language": "xx" })),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let errors = body["errors"].as_object().unwrap();
        assert!(errors.contains_key("name"));
        assert!(errors.contains_key("slug"));
        assert!(errors.contains_key("language"));
    }

    #[tokio::test]
    async fn videos_are_appended_and_reordered() {
        let (app, _, author) = setup();
        let playlist = create_playlist(&app, author, "calculo-1", true).await;
        let mut videos = Vec::new();
        for youtube_id in ["dQw4w9WgXcQ", "9bZkp7q19f0", "kJQP7kiw5Fk"] {
            let video = submit(&app, author, youtube_id).await;
            let (status, body) = send(
                &app,
                request(
                    Method::POST,
                    &format!("/api/v1/playlists/{}/videos", playlist),
                    Some(author),
                    Some(json!({ "videoId": video })),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["data"]["position"], videos.len());
            videos.push(video);
        }

        let order = vec![videos[2], videos[0], videos[1]];
        let (status, body) = send(
            &app,
            request(
                Method::PUT,
                &format!("/api/v1/playlists/{}/videos/order", playlist),
                Some(author),
                Some(json!({ "videoIds": order })),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Playlist reordered successfully!");
        let (_, body) = send(
            &app,
            request(Method::GET, &format!("/api/v1/playlists/{}/videos", playlist), None, None),
        )
        .await;
        let listed: Vec<(String, i64)> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| (e["videoId"].as_str().unwrap().to_string(), e["position"].as_i64().unwrap()))
            .collect();
        let expected: Vec<(String, i64)> = order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.to_string(), i as i64))
            .collect();
        assert_eq!(listed, expected);
    }

    #[tokio::test]
    async fn private_playlists_are_hidden_from_strangers() {
        let (app, store, author) = setup();
        let stranger = Uuid::new_v4();
        store.insert_profile(profile(stranger, "stranger"));
        let playlist = create_playlist(&app, author, "privada", false).await;
        let uri = format!("/api/v1/playlists/{}", playlist);

        let (status, _) = send(&app, request(Method::GET, &uri, None, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, request(Method::GET, &uri, Some(stranger), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, request(Method::GET, &uri, Some(author), None)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn viewers_cannot_edit_but_editors_can() {
        let (app, store, author) = setup();
        let (viewer, editor) = (Uuid::new_v4(), Uuid::new_v4());
        store.insert_profile(profile(viewer, "viewer"));
        store.insert_profile(profile(editor, "editor"));
        let playlist = create_playlist(&app, author, "compartilhada", true).await;
        let collaborators = format!("/api/v1/playlists/{}/collaborators", playlist);
        for (user, role) in [(viewer, "viewer"), (editor, "editor")] {
            let (status, _) = send(
                &app,
                request(
                    Method::POST,
                    &collaborators,
                    Some(author),
                    Some(json!({ "userId": user, "role": role })),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let uri = format!("/api/v1/playlists/{}", playlist);
        let rename = Some(json!({ "name": "Renomeada" }));
        let (status, _) = send(&app, request(Method::PUT, &uri, Some(viewer), rename.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, body) = send(&app, request(Method::PUT, &uri, Some(editor), rename)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Renomeada");

        let (status, _) = send(&app, request(Method::DELETE, &uri, Some(editor), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn progress_is_upserted_per_video() {
        let (app, store, author) = setup();
        let playlist = create_playlist(&app, author, "progresso", true).await;
        let video = submit(&app, author, "dQw4w9WgXcQ").await;
        let uri = format!("/api/v1/playlists/{}/progress/{}", playlist, video);

        for watched in [true, false] {
            let (status, body) = send(
                &app,
                request(
                    Method::PUT,
                    &uri,
                    Some(author),
                    Some(json!({ "watched": watched, "lastPositionSeconds": 42 })),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["data"]["watched"], watched);
        }

        let rows = store.list_progress(playlist, author).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].watched);
    }

    #[tokio::test]
    async fn view_increment_answers_with_the_optimistic_count() {
        let (app, _, author) = setup();
        let video = submit(&app, author, "dQw4w9WgXcQ").await;

        let (_, body) = send(&app, request(Method::GET, &format!("/api/v1/videos/{}", video), None, None)).await;
        assert_eq!(body["data"]["viewCount"], 0);

        let (status, body) = send(
            &app,
            request(Method::POST, &format!("/api/v1/videos/{}/view", video), None, None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["viewCount"], 1);

        let (_, body) = send(&app, request(Method::GET, &format!("/api/v1/videos/{}", video), None, None)).await;
        assert_eq!(body["data"]["viewCount"], 1);
    }

    #[tokio::test]
    async fn submitting_a_video_refreshes_the_cached_list() {
        let (app, _, author) = setup();
        submit(&app, author, "dQw4w9WgXcQ").await;

        let (_, body) = send(&app, request(Method::GET, "/api/v1/videos", None, None)).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        submit(&app, author, "9bZkp7q19f0").await;

        let (_, body) = send(&app, request(Method::GET, "/api/v1/videos", None, None)).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
        let (_, body) = send(&app, request(Method::GET, "/api/v1/stats/videos", None, None)).await;
        assert_eq!(body["data"]["count"], 2);
    }

    #[tokio::test]
    async fn duplicate_submission_is_a_conflict() {
        let (app, _, author) = setup();
        submit(&app, author, "dQw4w9WgXcQ").await;

        let (status, _) = send(
            &app,
            request(
                Method::POST,
                "/api/v1/videos",
                Some(author),
                Some(json!({ "url": "https://youtu.be/dQw4w9WgXcQ", "title": "Outra", "channelName": "Canal" })),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn language_cookie_round_trip() {
        let (app, _, _) = setup();

        let response = app
            .clone()
            .oneshot(request(Method::PUT, "/api/v1/language", None, Some(json!({ "language": "es" }))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        assert!(cookie.starts_with("i18nextLng=es"));

        let (_, body) = send(
            &app,
            Request::builder()
                .uri("/api/v1/language")
                .header(header::COOKIE, "i18nextLng=es")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(body["data"]["code"], "es");

        let (_, body) = send(&app, request(Method::GET, "/api/v1/language", None, None)).await;
        assert_eq!(body["data"]["code"], "pt");
    }

    #[tokio::test]
    async fn health_reports_store_outage() {
        let (app, store, _) = setup();

        let (status, _) = send(&app, request(Method::GET, "/health", None, None)).await;
        assert_eq!(status, StatusCode::OK);

        store.set_unavailable(true);
        let (status, body) = send(&app, request(Method::GET, "/health", None, None)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["store"], "down");
        assert_eq!(body["caches"]["categories"], 0);
    }

    #[tokio::test]
    async fn descriptors_fall_back_or_reject() {
        let (app, _, _) = setup();

        let (status, body) = send(&app, request(Method::GET, "/api/v1/icons/NoSuchIcon", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Link");

        let (status, _) = send(&app, request(Method::GET, "/api/v1/roles/admin", None, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, body) = send(&app, request(Method::GET, "/api/v1/roles/editor", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], "editor");
    }

    #[tokio::test]
    async fn translations_are_flattened_and_fall_back_to_default() {
        let (app, _, _) = setup();

        let (_, body) = send(&app, request(Method::GET, "/api/v1/i18n/en", None, None)).await;
        assert_eq!(body["data"]["language"], "en");
        assert_eq!(
            body["data"]["translations"]["auth.error.invalidEmail"],
            "Enter a valid email address"
        );

        let (_, body) = send(&app, request(Method::GET, "/api/v1/i18n/de", None, None)).await;
        assert_eq!(body["data"]["language"], "pt");
    }

    #[tokio::test]
    async fn featuring_top_videos_refreshes_the_video_list() {
        let (app, _, author) = setup();
        let video = submit(&app, author, "dQw4w9WgXcQ").await;
        let (_, body) = send(&app, request(Method::GET, "/api/v1/videos?featured=true", None, None)).await;
        assert!(body["data"].as_array().unwrap().is_empty());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/functions/v1/mark-top-featured")
                    .header(header::AUTHORIZATION, "Bearer anything")
                    .body(Body::from(r#"{"limit":1}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (_, body) = send(&app, request(Method::GET, "/api/v1/videos?featured=true", None, None)).await;
        let featured = body["data"].as_array().unwrap();
        assert_eq!(featured.len(), 1);
        assert_eq!(featured[0]["id"], video.to_string());
    }

    #[tokio::test]
    async fn profile_update_is_visible_by_username() {
        let (app, _, author) = setup();
        let (status, _) = send(
            &app,
            request(Method::GET, "/api/v1/profiles/by-username/author", None, None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            request(
                Method::PUT,
                "/api/v1/me/profile",
                Some(author),
                Some(json!({ "username": "curadora", "bio": "Matemática" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Profile updated!");

        let (status, body) = send(
            &app,
            request(Method::GET, "/api/v1/profiles/by-username/curadora", None, None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["bio"], "Matemática");
        let (status, _) = send(
            &app,
            request(Method::GET, "/api/v1/profiles/by-username/author", None, None),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn view_increment_hides_store_failures() {
        let (app, store, author) = setup();
        let video = submit(&app, author, "dQw4w9WgXcQ").await;
        let (status, _) = send(&app, request(Method::GET, &format!("/api/v1/videos/{}", video), None, None)).await;
        assert_eq!(status, StatusCode::OK);

        store.set_unavailable(true);
        let (status, body) = send(
            &app,
            request(Method::POST, &format!("/api/v1/videos/{}/view", video), None, None),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["viewCount"], 1);
    }

    #[tokio::test]
    async fn sign_up_validation_reports_fields_and_taken_usernames() {
        let (app, _, _) = setup();
        let uri = "/api/v1/sign-up/validate";

        let (status, body) = send(
            &app,
            request(
                Method::POST,
                uri,
                None,
                Some(json!({ "email": "nope", "password": "123", "username": "ab" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"]["email"][0], "auth.error.invalidEmail");
        assert_eq!(body["errors"]["password"][0], "auth.error.passwordMinLength");
        assert_eq!(body["errors"]["username"][0], "auth.error.usernameMinLength");

        let (status, _) = send(
            &app,
            request(
                Method::POST,
                uri,
                None,
                Some(json!({ "email": "ana@example.com", "password": "secret1", "username": "author" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(
            &app,
            request(
                Method::POST,
                uri,
                None,
                Some(json!({ "email": "ana@example.com", "password": "secret1", "username": "ana" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn category_lookup_keeps_the_first_seen_row() {
        let (app, store, _) = setup();
        let category = Category {
            id: Uuid::new_v4(),
            name: "Matemática".into(),
            slug: "matematica".into(),
            icon: "Calculator".into(),
            color: "blue".into(),
            created_at: Utc::now(),
        };
        store.insert_category(category.clone());

        let (_, body) = send(&app, request(Method::GET, "/api/v1/categories", None, None)).await;
        assert_eq!(body["data"][0]["name"], "Matemática");

        store.replace_category(Category {
            name: "Matemática Aplicada".into(),
            ..category.clone()
        });
        let (status, body) = send(
            &app,
            request(Method::GET, &format!("/api/v1/categories/{}", category.id), None, None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Matemática");
    }
}
