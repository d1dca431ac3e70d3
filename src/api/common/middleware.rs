use axum::{
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};
use cookie::Cookie;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::InnerState;

/// Cookie the web client keeps the hosted auth session's access token in.
pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";
pub const TOKEN_AUDIENCE: &str = "authenticated";

/// Claims of an access token issued by the hosted auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: Option<String>,
    pub role: Option<String>,
    pub exp: usize,
}

/// The signed-in caller, available to handlers behind [`auth_middleware`].
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
}

pub async fn auth_middleware(
    State(inner): State<InnerState>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&request)
        .ok_or_else(|| AppError::Authentication(anyhow::anyhow!("Missing token")))?;

    let claims = decode_token(&token, inner.settings.jwt_secret.expose_secret())?;
    tracing::debug!(user_id = %claims.sub, "Authenticated request");

    request.extensions_mut().insert(AuthUser { id: claims.sub });
    Ok(next.run(request).await)
}

/// Like [`auth_middleware`] but never rejects: a valid token adds the
/// [`AuthUser`], anything else leaves the request anonymous.
pub async fn optional_auth_middleware(
    State(inner): State<InnerState>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    if let Some(token) = extract_token(&request) {
        if let Ok(claims) = decode_token(&token, inner.settings.jwt_secret.expose_secret()) {
            request.extensions_mut().insert(AuthUser { id: claims.sub });
        }
    }
    next.run(request).await
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[TOKEN_AUDIENCE]);

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::warn!("JWT validation failed: {:?}", e);
            AppError::Authentication(anyhow::anyhow!("Invalid or expired token"))
        })
}

/// Extracts the JWT from either the `Authorization` header or the session cookie.
fn extract_token<B>(req: &Request<B>) -> Option<String> {
    if let Some(auth_header) = req.headers().get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    if let Some(cookie_header) = req.headers().get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                if let Ok(parsed) = Cookie::parse(cookie.trim()) {
                    if parsed.name() == ACCESS_TOKEN_COOKIE {
                        return Some(parsed.value().to_string());
                    }
                }
            }
        }
    }

    None
}

#[cfg(test)]
pub mod test_support {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;
    use uuid::Uuid;

    pub fn token_for(user_id: Uuid, secret: &str) -> String {
        let exp = chrono::Utc::now().timestamp() as usize + 3600;
        encode(
            &Header::default(),
            &json!({
                "sub": user_id,
                "aud": super::TOKEN_AUDIENCE,
                "email": "tester@example.com",
                "role": "authenticated",
                "exp": exp,
            }),
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_tokens_signed_with_the_shared_secret() {
        let user = Uuid::new_v4();
        let token = test_support::token_for(user, "secret");

        let claims = decode_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, user);
        assert!(decode_token(&token, "other-secret").is_err());
    }

    #[test]
    fn token_is_read_from_header_or_cookie() {
        let from_header = Request::builder()
            .header(header::AUTHORIZATION, "Bearer abc")
            .body(())
            .unwrap();
        assert_eq!(extract_token(&from_header).as_deref(), Some("abc"));

        let from_cookie = Request::builder()
            .header(header::COOKIE, "i18nextLng=en; sb-access-token=xyz")
            .body(())
            .unwrap();
        assert_eq!(extract_token(&from_cookie).as_deref(), Some("xyz"));

        let none = Request::builder().body(()).unwrap();
        assert_eq!(extract_token(&none), None);
    }
}
