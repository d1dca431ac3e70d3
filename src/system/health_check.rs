use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::InnerState;

/// Liveness plus a cheap round trip to the store, with the current cache sizes.
#[tracing::instrument(name = "Health check", skip(inner))]
pub async fn health_check(State(inner): State<InnerState>) -> impl IntoResponse {
    let flyweights = &inner.flyweights;
    let caches = json!({
        "queries": inner.cache.len(),
        "icons": flyweights.icons.len(),
        "languages": flyweights.languages.len(),
        "roles": flyweights.roles.len(),
        "styles": flyweights.styles.len(),
        "categories": flyweights.categories.len(),
    });

    match inner.store.count_videos().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "store": "up", "caches": caches })),
        ),
        Err(e) => {
            tracing::warn!("Store health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "store": "down", "caches": caches })),
            )
        }
    }
}
