//! Session cookie handling.
//!
//! Sessions live in the data directory; the browser only holds the opaque
//! session token in an `HttpOnly` cookie.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, header, request::Parts},
};
use chrono::{DateTime, Utc};
use cookie::time::OffsetDateTime;
use cookie::{Cookie, SameSite};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "session_token";

/// Build the cookie for a new session.
#[must_use]
pub fn session_cookie(token: &str, expires_at: DateTime<Utc>, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token.to_owned()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .expires(OffsetDateTime::from_unix_timestamp(expires_at.timestamp()).ok())
        .build()
}

/// Build the cookie that removes the session cookie.
#[must_use]
pub fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .removal()
        .build()
}

/// Append a `Set-Cookie` header, skipping cookies that are not valid header
/// text.
pub fn append_set_cookie(headers: &mut HeaderMap, cookie: &Cookie<'_>) {
    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            headers.append(header::SET_COOKIE, value);
        }
        Err(e) => tracing::error!(error = %e, "invalid Set-Cookie value"),
    }
}

/// Read the session token from the request's `Cookie` headers.
///
/// An empty cookie value counts as no session.
#[must_use]
pub fn session_token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(std::result::Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_owned())
        .filter(|token| !token.is_empty())
}

/// Extractor for the raw session token cookie, if any.
///
/// The token is not checked against the data directory; use
/// [`RequireAuth`](super::RequireAuth) or [`OptionalAuth`](super::OptionalAuth)
/// for a resolved session.
pub struct SessionCookie(pub Option<String>);

impl<S> FromRequestParts<S> for SessionCookie
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_token_from_headers(&parts.headers)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let expires = DateTime::parse_from_rfc3339("2025-03-07T09:05:01Z")
            .unwrap()
            .with_timezone(&Utc);

        let cookie = session_cookie("abc-123", expires, false);
        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert_eq!(cookie.value(), "abc-123");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_ne!(cookie.secure(), Some(true));
        assert_eq!(
            cookie.expires_datetime().map(OffsetDateTime::unix_timestamp),
            Some(expires.timestamp())
        );

        let header = cookie.to_string();
        assert!(header.starts_with("session_token=abc-123;"));
        assert!(header.contains("Expires=Fri, 07 Mar 2025 09:05:01 GMT"));
        assert!(!header.contains("Secure"));

        let secure = session_cookie("abc-123", expires, true);
        assert_eq!(secure.secure(), Some(true));
        assert!(secure.to_string().contains("; Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = clear_session_cookie(true);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(cookie::time::Duration::ZERO));
        assert_eq!(cookie.secure(), Some(true));

        let header = cookie.to_string();
        assert!(header.starts_with("session_token=;"));
        assert!(header.contains("Max-Age=0"));
        assert!(header.contains("Path=/"));
    }

    #[test]
    fn test_append_set_cookie() {
        let mut headers = HeaderMap::new();
        append_set_cookie(&mut headers, &clear_session_cookie(false));
        append_set_cookie(&mut headers, &Cookie::new("theme", "dark"));

        let values: Vec<&str> = headers
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(values.len(), 2);
        assert!(values.contains(&"theme=dark"));
    }

    #[test]
    fn test_token_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token_from_headers(&headers), None);

        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session_token=tok-1; other=x"),
        );
        assert_eq!(session_token_from_headers(&headers), Some("tok-1".to_owned()));
    }

    #[test]
    fn test_token_from_second_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(header::COOKIE, HeaderValue::from_static("session_token=tok-2"));
        assert_eq!(session_token_from_headers(&headers), Some("tok-2".to_owned()));
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("session_token="));
        assert_eq!(session_token_from_headers(&headers), None);

        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("my_session_token=nope"),
        );
        assert_eq!(session_token_from_headers(&headers), None);
    }
}
