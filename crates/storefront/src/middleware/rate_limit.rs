//! Client identification and request-rate limiting.
//!
//! Two limits apply:
//! - `api_rate_limiter`: a token bucket per client IP over the whole API
//!   (governor and `tower_governor`), ~100 requests per minute
//! - per-action attempt windows for signup, login and verification, checked
//!   in the handlers through [`ClientId`] and
//!   [`RateLimiter`](crate::services::rate_limit::RateLimiter)

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, Request, header, request::Parts},
};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Identifier used when a request carries nothing to tell clients apart.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Identify the client behind a request for attempt counting.
///
/// Uses the first `X-Forwarded-For` entry when that header is present (or
/// `unknown` if the entry is blank), then `X-Real-IP`, then the
/// `User-Agent`, then `unknown`.
#[must_use]
pub fn client_identifier(headers: &HeaderMap) -> String {
    let header_str = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    if let Some(forwarded_for) = header_str("x-forwarded-for") {
        return forwarded_for
            .split(',')
            .next()
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .unwrap_or(UNKNOWN_CLIENT)
            .to_owned();
    }

    if let Some(real_ip) = header_str("x-real-ip").filter(|ip| !ip.is_empty()) {
        return real_ip.to_owned();
    }

    header_str(header::USER_AGENT.as_str())
        .filter(|ua| !ua.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_owned()
}

/// Extractor for the request's client identifier.
///
/// See [`client_identifier`].
pub struct ClientId(pub String);

impl<S> FromRequestParts<S> for ClientId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(client_identifier(&parts.headers)))
    }
}

// =============================================================================
// Forwarded IP Key Extractor
// =============================================================================

/// Key extractor that trusts standard proxy headers, then falls back to the
/// peer address of the connection.
#[derive(Clone, Copy)]
pub struct ForwardedIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ForwardedIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();

        // Try X-Forwarded-For (first IP in the chain)
        if let Some(ip) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        // Try X-Real-IP
        if let Some(ip) = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        // Direct connection (requires `into_make_service_with_connect_info`)
        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

// =============================================================================
// Rate Limiter Configuration
// =============================================================================

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ForwardedIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for the API: ~100 requests per minute per IP.
///
/// Configuration: 1 request per second (replenish), burst of 50.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers (`per_second(1)` and `burst_size(50)`), which are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn api_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ForwardedIpKeyExtractor)
        .per_second(1) // Replenish quickly
        .burst_size(50) // Allow burst of 50 requests
        .finish()
        .expect("rate limiter config with per_second(1) and burst_size(50) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use tower_governor::key_extractor::KeyExtractor;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn test_forwarded_for_wins() {
        let headers = headers(&[
            ("x-forwarded-for", " 203.0.113.9 , 10.0.0.1"),
            ("x-real-ip", "198.51.100.2"),
            ("user-agent", "curl/8"),
        ]);
        assert_eq!(client_identifier(&headers), "203.0.113.9");
    }

    #[test]
    fn test_blank_forwarded_for_is_unknown() {
        let headers = headers(&[("x-forwarded-for", " , 10.0.0.1"), ("x-real-ip", "1.1.1.1")]);
        assert_eq!(client_identifier(&headers), UNKNOWN_CLIENT);
    }

    #[test]
    fn test_fallback_chain() {
        assert_eq!(
            client_identifier(&headers(&[("x-real-ip", "198.51.100.2"), ("user-agent", "curl/8")])),
            "198.51.100.2"
        );
        assert_eq!(client_identifier(&headers(&[("user-agent", "curl/8")])), "curl/8");
        assert_eq!(client_identifier(&HeaderMap::new()), UNKNOWN_CLIENT);
    }

    #[test]
    fn test_key_extractor_uses_connect_info() {
        let mut req = Request::builder().body(()).unwrap();
        assert!(ForwardedIpKeyExtractor.extract(&req).is_err());

        let addr: SocketAddr = "192.0.2.7:5555".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(ForwardedIpKeyExtractor.extract(&req).unwrap(), addr.ip());

        req.headers_mut()
            .insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9"));
        assert_eq!(
            ForwardedIpKeyExtractor.extract(&req).unwrap().to_string(),
            "203.0.113.9"
        );
    }
}
