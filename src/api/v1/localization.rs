use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use crate::{
    api::common::{
        utils::{language_from_cookies, set_language_cookie},
        ApiResponse,
    },
    flyweights::language::Language,
    i18n::{resolve_supported, Dictionary},
    InnerState,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Translations {
    pub language: &'static str,
    pub translations: Arc<Dictionary>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Translation {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangeLanguage {
    pub language: String,
}

#[tracing::instrument(name = "Get translations", skip(inner))]
pub async fn translations(
    State(inner): State<InnerState>,
    Path(lang): Path<String>,
) -> Json<ApiResponse<Translations>> {
    let language = resolve_supported(&lang);
    Json(ApiResponse::success(Translations {
        language,
        translations: inner.locales.dictionary(language),
    }))
}

pub async fn translate(
    State(inner): State<InnerState>,
    Path((lang, key)): Path<(String, String)>,
) -> Json<ApiResponse<Translation>> {
    let value = inner.locales.translate(&lang, &key);
    Json(ApiResponse::success(Translation { key, value }))
}

pub async fn supported_languages(State(inner): State<InnerState>) -> Json<ApiResponse<Vec<Arc<Language>>>> {
    Json(ApiResponse::success(inner.flyweights.languages.supported()))
}

/// The language stored in the client's cookie, or the default one.
pub async fn current_language(State(inner): State<InnerState>, cookies: Cookies) -> Json<ApiResponse<Arc<Language>>> {
    let language = match language_from_cookies(&cookies) {
        Some(code) => inner.flyweights.languages.get(resolve_supported(&code)),
        None => inner.flyweights.languages.default_language(),
    };
    Json(ApiResponse::success(language))
}

#[tracing::instrument(name = "Change language", skip(inner, cookies))]
pub async fn change_language(
    State(inner): State<InnerState>,
    cookies: Cookies,
    Json(payload): Json<ChangeLanguage>,
) -> Json<ApiResponse<Arc<Language>>> {
    let code = resolve_supported(&payload.language);
    if code != payload.language {
        tracing::debug!("Unsupported language {}, using {}", payload.language, code);
    }
    set_language_cookie(code, &cookies);
    Json(ApiResponse::success(inner.flyweights.languages.get(code)))
}
