//! Refresh session cookie parsing and construction.

use std::sync::Arc;

use axum::http::{HeaderMap, header};
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::OffsetDateTime;
use tracing::debug;

use crate::config::AuthConfig;

/// Extract a cookie value from the Cookie header(s).
///
/// Only the first cookie with a matching name is returned; later duplicates
/// are ignored.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let mut found = None;
    for cookie_header in headers.get_all(header::COOKIE) {
        let Ok(cookie_header) = cookie_header.to_str() else {
            continue;
        };
        for part in cookie_header.split(';') {
            let Some((key, value)) = part.trim().split_once('=') else {
                continue;
            };
            if key.trim() != name {
                continue;
            }
            if found.is_some() {
                debug!(cookie = %name, "Ignoring duplicate cookie");
            } else {
                found = Some(value.trim());
            }
        }
    }
    found
}

/// Builds the two cookie shapes this service ever sets: the live session
/// cookie and its tombstone.
#[derive(Clone)]
pub struct SessionCookies {
    config: Arc<AuthConfig>,
}

impl SessionCookies {
    pub fn new(config: Arc<AuthConfig>) -> Self {
        Self { config }
    }

    /// Name of the session cookie.
    pub fn name(&self) -> &str {
        &self.config.cookie_name
    }

    /// Cookie carrying `refresh_token`, valid for the refresh lifetime from `now`.
    pub fn session(&self, refresh_token: &str, now: u64) -> Cookie<'static> {
        let ttl = i64::try_from(self.config.refresh_ttl.as_secs()).unwrap_or(i64::MAX);
        let mut cookie = self.base(refresh_token.to_string());
        cookie.set_max_age(time::Duration::seconds(ttl));
        let expires = i64::try_from(now)
            .ok()
            .and_then(|now| now.checked_add(ttl))
            .and_then(|at| OffsetDateTime::from_unix_timestamp(at).ok());
        if let Some(expires) = expires {
            cookie.set_expires(expires);
        }
        cookie
    }

    /// Cookie that makes the client drop any existing session immediately.
    pub fn tombstone(&self) -> Cookie<'static> {
        let mut cookie = self.base(String::new());
        cookie.set_max_age(time::Duration::seconds(-1));
        cookie.set_expires(OffsetDateTime::UNIX_EPOCH);
        cookie
    }

    fn base(&self, value: String) -> Cookie<'static> {
        let mut cookie = Cookie::build((self.config.cookie_name.clone(), value))
            .path(self.config.cookie_path.clone())
            .http_only(true)
            .secure(true)
            .same_site(SameSite::Strict)
            .build();
        if let Some(domain) = &self.config.cookie_domain {
            cookie.set_domain(domain.clone());
        }
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &[u8] = b"test-secret-key-for-testing-0123456789";
    const NOW: u64 = 1_700_000_000;

    fn cookies(domain: Option<&str>) -> SessionCookies {
        let mut config = AuthConfig::new("example.com", "example.com", SECRET);
        config.cookie_name = "refresh_token".to_string();
        config.cookie_domain = domain.map(str::to_string);
        SessionCookies::new(Arc::new(config))
    }

    #[test]
    fn test_get_cookie_simple() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("refresh_token=abc123"),
        );

        assert_eq!(get_cookie(&headers, "refresh_token"), Some("abc123"));
    }

    #[test]
    fn test_get_cookie_multiple() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("foo=bar; refresh_token=xyz789; theme=dark"),
        );

        assert_eq!(get_cookie(&headers, "refresh_token"), Some("xyz789"));
        assert_eq!(get_cookie(&headers, "foo"), Some("bar"));
        assert_eq!(get_cookie(&headers, "theme"), Some("dark"));
    }

    #[test]
    fn test_get_cookie_not_found() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("foo=bar"));

        assert_eq!(get_cookie(&headers, "refresh_token"), None);
    }

    #[test]
    fn test_get_cookie_no_header() {
        let headers = HeaderMap::new();
        assert_eq!(get_cookie(&headers, "refresh_token"), None);
    }

    #[test]
    fn test_get_cookie_with_spaces() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("  refresh_token = abc123  ; foo=bar"),
        );

        assert_eq!(get_cookie(&headers, "refresh_token"), Some("abc123"));
    }

    #[test]
    fn test_get_cookie_first_duplicate_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("refresh_token=first; refresh_token=second"),
        );

        assert_eq!(get_cookie(&headers, "refresh_token"), Some("first"));
    }

    #[test]
    fn test_get_cookie_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("foo=bar"));
        headers.append(
            header::COOKIE,
            HeaderValue::from_static("refresh_token=first"),
        );
        headers.append(
            header::COOKIE,
            HeaderValue::from_static("refresh_token=second"),
        );

        assert_eq!(get_cookie(&headers, "refresh_token"), Some("first"));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = cookies(Some("example.com")).session("token-value", NOW);

        assert_eq!(cookie.name(), "refresh_token");
        assert_eq!(cookie.value(), "token-value");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(86400)));
        assert_eq!(
            cookie.expires_datetime().map(|t| t.unix_timestamp()),
            Some(NOW as i64 + 86400)
        );
    }

    #[test]
    fn test_session_cookie_without_domain() {
        let cookie = cookies(None).session("token-value", NOW);

        assert_eq!(cookie.domain(), None);
        assert!(!cookie.to_string().contains("Domain="));
    }

    #[test]
    fn test_session_cookie_with_oversized_lifetime_stays_live() {
        let mut config = AuthConfig::new("example.com", "example.com", SECRET);
        config.refresh_ttl = std::time::Duration::from_secs(u64::MAX);
        let cookie = SessionCookies::new(Arc::new(config)).session("token-value", NOW);

        let max_age = cookie.max_age().expect("max-age should be set");
        assert!(max_age.is_positive());
        assert_eq!(cookie.expires_datetime(), None);
    }

    #[test]
    fn test_tombstone_cookie_attributes() {
        let cookie = cookies(Some("example.com")).tombstone();

        assert_eq!(cookie.name(), "refresh_token");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(-1)));
        assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));

        let header = cookie.to_string();
        assert!(header.contains("Max-Age=-1"));
        assert!(header.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
    }
}
