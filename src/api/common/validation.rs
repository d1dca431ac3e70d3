//! Input checks run before any store call. Failures carry translation keys
//! per field so the client can show them inline.

use std::collections::HashMap;

use url::Url;

use crate::entities::playlist::{NewPlaylist, PlaylistChanges};
use crate::entities::profile::ProfileChanges;
use crate::entities::social_account::{NewSocialAccount, SocialAccountChanges, PLATFORMS};
use crate::errors::AppError;
use crate::flyweights::language;

pub const INVALID_EMAIL: &str = "auth.error.invalidEmail";
pub const PASSWORD_MIN_LENGTH: &str = "auth.error.passwordMinLength";
pub const USERNAME_MIN_LENGTH: &str = "auth.error.usernameMinLength";
pub const NAME_REQUIRED: &str = "playlist.error.nameRequired";
pub const INVALID_SLUG: &str = "playlist.error.invalidSlug";
pub const INVALID_LANGUAGE: &str = "playlist.error.invalidLanguage";
pub const INVALID_VIDEO_URL: &str = "video.error.invalidUrl";
pub const INVALID_PLATFORM: &str = "social.error.invalidPlatform";
pub const INVALID_SOCIAL_URL: &str = "social.error.invalidUrl";

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_USERNAME_LEN: usize = 3;

#[derive(Debug, Default)]
pub struct FieldErrors(HashMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, key: &str) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(key.to_string());
    }

    pub fn check(&mut self, ok: bool, field: &str, key: &str) {
        if !ok {
            self.add(field, key);
        }
    }

    pub fn into_result(self) -> Result<(), AppError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::ValidationErrors(self.0))
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.contains(char::is_whitespace)
        && domain
            .split_once('.')
            .map_or(false, |(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

/// Lowercase words joined by single hyphens, e.g. `intro-to-rust-2`.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .split('-')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()))
}

pub fn is_http_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false)
}

/// Sign-up form of the web client. Accounts are created by the hosted auth
/// service, so this only mirrors the checks the client runs beforehand.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub username: String,
}

impl SignUpForm {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = FieldErrors::default();
        errors.check(is_valid_email(&self.email), "email", INVALID_EMAIL);
        errors.check(
            self.password.chars().count() >= MIN_PASSWORD_LEN,
            "password",
            PASSWORD_MIN_LENGTH,
        );
        errors.check(
            self.username.trim().chars().count() >= MIN_USERNAME_LEN,
            "username",
            USERNAME_MIN_LENGTH,
        );
        errors.into_result()
    }
}

pub fn validate_new_playlist(playlist: &NewPlaylist) -> Result<(), AppError> {
    let mut errors = FieldErrors::default();
    errors.check(!playlist.name.trim().is_empty(), "name", NAME_REQUIRED);
    errors.check(is_valid_slug(&playlist.slug), "slug", INVALID_SLUG);
    errors.check(language::is_registered(&playlist.language), "language", INVALID_LANGUAGE);
    errors.into_result()
}

pub fn validate_playlist_changes(changes: &PlaylistChanges) -> Result<(), AppError> {
    let mut errors = FieldErrors::default();
    if let Some(name) = &changes.name {
        errors.check(!name.trim().is_empty(), "name", NAME_REQUIRED);
    }
    if let Some(slug) = &changes.slug {
        errors.check(is_valid_slug(slug), "slug", INVALID_SLUG);
    }
    if let Some(lang) = &changes.language {
        errors.check(language::is_registered(lang), "language", INVALID_LANGUAGE);
    }
    errors.into_result()
}

/// An empty username is allowed and clears it.
pub fn validate_profile_changes(changes: &ProfileChanges) -> Result<(), AppError> {
    let mut errors = FieldErrors::default();
    if let Some(username) = &changes.username {
        let len = username.trim().chars().count();
        errors.check(len == 0 || len >= MIN_USERNAME_LEN, "username", USERNAME_MIN_LENGTH);
    }
    errors.into_result()
}

pub fn validate_new_social_account(account: &NewSocialAccount) -> Result<(), AppError> {
    let mut errors = FieldErrors::default();
    errors.check(PLATFORMS.contains(&account.platform.as_str()), "platform", INVALID_PLATFORM);
    errors.check(is_http_url(&account.url), "url", INVALID_SOCIAL_URL);
    errors.into_result()
}

pub fn validate_social_account_changes(changes: &SocialAccountChanges) -> Result<(), AppError> {
    let mut errors = FieldErrors::default();
    if let Some(platform) = &changes.platform {
        errors.check(PLATFORMS.contains(&platform.as_str()), "platform", INVALID_PLATFORM);
    }
    if let Some(url) = &changes.url {
        errors.check(is_http_url(url), "url", INVALID_SOCIAL_URL);
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_errors(result: Result<(), AppError>) -> HashMap<String, Vec<String>> {
        match result {
            Err(AppError::ValidationErrors(errors)) => errors,
            other => panic!("expected validation errors, got {:?}", other),
        }
    }

    #[test]
    fn sign_up_reports_every_failing_field() {
        let form = SignUpForm {
            email: "not-an-email".into(),
            password: "123".into(),
            username: "ab".into(),
        };
        let errors = field_errors(form.validate());

        assert_eq!(errors["email"], vec![INVALID_EMAIL]);
        assert_eq!(errors["password"], vec![PASSWORD_MIN_LENGTH]);
        assert_eq!(errors["username"], vec![USERNAME_MIN_LENGTH]);
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("ana@example.com"));
        assert!(!is_valid_email("ana@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ana @example.com"));
    }

    #[test]
    fn slugs_are_lowercase_kebab_case() {
        assert!(is_valid_slug("intro-to-rust-2"));
        assert!(!is_valid_slug("Intro"));
        assert!(!is_valid_slug("double--dash"));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn empty_username_clears_instead_of_failing() {
        let clear = ProfileChanges {
            username: Some(String::new()),
            ..Default::default()
        };
        assert!(validate_profile_changes(&clear).is_ok());

        let short = ProfileChanges {
            username: Some("ab".into()),
            ..Default::default()
        };
        assert!(validate_profile_changes(&short).is_err());
    }

    #[test]
    fn social_accounts_need_known_platform_and_http_url() {
        let account = NewSocialAccount {
            platform: "myspace".into(),
            url: "ftp://example.com".into(),
        };
        let errors = field_errors(validate_new_social_account(&account));
        assert!(errors.contains_key("platform"));
        assert!(errors.contains_key("url"));

        let ok = NewSocialAccount {
            platform: "github".into(),
            url: "https://github.com/someone".into(),
        };
        assert!(validate_new_social_account(&ok).is_ok());
    }
}
