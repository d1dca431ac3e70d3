//! Hooks for `tower_http::trace::TraceLayer`.
//!
//! Every request gets an `http_request` span; credentials (bearer tokens,
//! the session cookie, the backend `apikey`) never reach the logs.

use axum::http::{HeaderMap, Request, Response};
use std::collections::BTreeMap;
use std::time::Duration;
use tower_http::classify::ServerErrorsFailureClass;
use tracing::{info_span, Span};

const REDACTED_HEADERS: [&str; 4] = ["authorization", "cookie", "set-cookie", "apikey"];

fn is_sensitive(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    REDACTED_HEADERS.contains(&name.as_str()) || name.contains("token")
}

fn loggable_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            if is_sensitive(name.as_str()) {
                Some((name.to_string(), "[REDACTED]".to_string()))
            } else {
                value.to_str().ok().map(|v| (name.to_string(), v.to_string()))
            }
        })
        .collect()
}

pub fn make_span<B>(request: &Request<B>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        query = ?request.uri().query(),
        request_id = request_id,
        client_info = ?request.headers().get("x-client-info"),
    )
}

pub fn on_request<B>(request: &Request<B>, _span: &Span) {
    tracing::debug!(
        method = %request.method(),
        uri = %request.uri(),
        headers = ?loggable_headers(request.headers()),
        "Incoming HTTP request"
    );
}

pub fn on_response<B>(response: &Response<B>, latency: Duration, _span: &Span) {
    let status = response.status();
    let latency_ms = latency.as_millis();

    if status.is_server_error() {
        tracing::error!(status = %status, latency_ms, "HTTP request completed with server error");
    } else if status.is_client_error() {
        tracing::warn!(status = %status, latency_ms, "HTTP request completed with client error");
    } else {
        tracing::info!(status = %status, latency_ms, "HTTP request completed");
    }
}

pub fn on_failure(error: ServerErrorsFailureClass, latency: Duration, _span: &Span) {
    let error_type = match &error {
        ServerErrorsFailureClass::StatusCode(code) => format!("HTTP {}", code.as_u16()),
        ServerErrorsFailureClass::Error(_) => "Internal Error".to_string(),
    };

    tracing::error!(
        error = ?error,
        latency_ms = latency.as_millis(),
        error_type = error_type,
        "HTTP request failed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn credentials_are_redacted() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer secret"));
        headers.insert("apikey", HeaderValue::from_static("anon"));
        headers.insert("x-refresh-token", HeaderValue::from_static("r"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let logged = loggable_headers(&headers);
        assert_eq!(logged["authorization"], "[REDACTED]");
        assert_eq!(logged["apikey"], "[REDACTED]");
        assert_eq!(logged["x-refresh-token"], "[REDACTED]");
        assert_eq!(logged["content-type"], "application/json");
    }
}
