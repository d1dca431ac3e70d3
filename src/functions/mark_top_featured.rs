use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::api::common::keys;
use crate::errors::AppError;
use crate::InnerState;

pub const DEFAULT_LIMIT: i32 = 4;

const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    response
}

pub async fn preflight() -> Response {
    with_cors(StatusCode::OK.into_response())
}

/// `limit` from an optional JSON body. Only whole numbers that fit the
/// procedure's `int` parameter are taken; anything else (unparsable body,
/// strings, fractions, out of range) falls back to [`DEFAULT_LIMIT`].
pub fn requested_limit(body: &[u8]) -> i32 {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("limit").and_then(Value::as_i64))
        .and_then(|n| i32::try_from(n).ok())
        .unwrap_or(DEFAULT_LIMIT)
}

#[tracing::instrument(name = "mark-top-featured", skip(inner, headers, body))]
pub async fn mark_top_featured(
    State(inner): State<InnerState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(auth_header) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    else {
        tracing::error!("Unauthorized: No Authorization header provided");
        return with_cors((StatusCode::UNAUTHORIZED, "Unauthorized").into_response());
    };

    let token = auth_header.replacen("Bearer ", "", 1);
    let limit = requested_limit(&body);

    match inner.featured_rpc.mark_top_videos_as_featured(&token, limit).await {
        Ok(updated) => {
            tracing::info!(limit, updated = %updated, "Marked top videos as featured");
            inner.cache.invalidate([keys::VIDEOS, keys::VIDEO]);
            with_cors(
                (
                    StatusCode::OK,
                    Json(json!({ "message": "Marked top videos as featured", "updated": updated })),
                )
                    .into_response(),
            )
        }
        Err(e) => {
            let message = match &e {
                AppError::ExternalService(source) | AppError::Database(source) => source.to_string(),
                other => other.to_string(),
            };
            tracing::error!("RPC error: {}", message);
            with_cors((StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": message }))).into_response())
        }
    }
}
