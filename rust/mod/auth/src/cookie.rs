//! Session cookie helpers.

use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::HeaderMap;

use crate::service::AuthConfig;

/// Find a cookie value by name across all `Cookie` headers.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim_matches('"'))
        .filter(|v| !v.is_empty())
}

/// Extract the Bearer token from the Authorization header.
pub fn read_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// `Set-Cookie` value carrying a session token.
pub fn session_cookie(config: &AuthConfig, token: &str) -> String {
    build(config, token, config.session_ttl.max(0))
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_cookie(config: &AuthConfig) -> String {
    build(config, "", 0)
}

fn build(config: &AuthConfig, value: &str, max_age: i64) -> String {
    let mut parts = vec![
        format!("{}={}", config.cookie_name, value),
        "HttpOnly".to_string(),
        "Path=/".to_string(),
        "SameSite=Lax".to_string(),
        format!("Max-Age={max_age}"),
    ];
    if config.secure_cookie {
        parts.push("Secure".to_string());
    }
    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_named_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; todolist.session_token=abc.def"));
        headers.append(COOKIE, HeaderValue::from_static("other=1"));
        assert_eq!(read_cookie(&headers, "todolist.session_token"), Some("abc.def"));
        assert_eq!(read_cookie(&headers, "other"), Some("1"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn empty_cookie_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("todolist.session_token="));
        assert_eq!(read_cookie(&headers, "todolist.session_token"), None);
    }

    #[test]
    fn bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(read_bearer(&headers), Some("xyz"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert_eq!(read_bearer(&headers), None);
    }

    #[test]
    fn cookie_attributes() {
        let config = AuthConfig::default();
        assert_eq!(
            session_cookie(&config, "tok"),
            "todolist.session_token=tok; HttpOnly; Path=/; SameSite=Lax; Max-Age=604800"
        );

        let secure = AuthConfig {
            secure_cookie: true,
            ..AuthConfig::default()
        };
        assert_eq!(
            clear_cookie(&secure),
            "todolist.session_token=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0; Secure"
        );
    }
}
