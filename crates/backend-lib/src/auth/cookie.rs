// ============================
// crates/backend-lib/src/auth/cookie.rs
// ============================
//! `Cookie` header parsing and `Set-Cookie` construction.
use axum::http::{header::COOKIE, HeaderMap};

/// Name of the session cookie
pub const SESSION_COOKIE_NAME: &str = "__session";

const EPOCH_HTTP_DATE: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Find a cookie value across all `Cookie` headers of a request
pub fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
}

/// Build a site-wide, `HttpOnly`, `SameSite=Lax` cookie
pub fn build_cookie(name: &str, value: &str, max_age_secs: u64, secure: bool) -> String {
    let mut cookie =
        format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Build a cookie that makes the browser drop `name` immediately
pub fn expired_cookie(name: &str, secure: bool) -> String {
    let mut cookie = build_cookie(name, "", 0, secure);
    cookie.push_str("; Expires=");
    cookie.push_str(EPOCH_HTTP_DATE);
    cookie
}
