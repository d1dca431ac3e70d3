use cookie::{Cookie, SameSite};
use time::OffsetDateTime;
use tower_cookies::Cookies;

/// Cookie the web client's i18n layer reads the chosen language from.
pub const LANGUAGE_COOKIE: &str = "i18nextLng";

pub fn language_from_cookies(cookies: &Cookies) -> Option<String> {
    cookies
        .get(LANGUAGE_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// Persists the language for a year. Readable by the client, unlike the session cookie.
pub fn set_language_cookie(code: &str, cookies: &Cookies) {
    let mut cookie = Cookie::new(LANGUAGE_COOKIE, code.to_string());

    let mut expires = OffsetDateTime::now_utc();
    expires += time::Duration::days(365);

    cookie.set_path("/");
    cookie.set_expires(expires);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_http_only(false);
    cookies.add(cookie);
}
