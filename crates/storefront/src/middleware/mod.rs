//! HTTP middleware and extractors for the storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Rate limiting (governor, outermost, only when serving real sockets)
//!
//! Sessions are not a layer: handlers pull them from the cookie with the
//! [`RequireAuth`] / [`OptionalAuth`] extractors.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth};
pub use rate_limit::{ClientId, api_rate_limiter, client_identifier};
pub use request_id::request_id_middleware;
pub use session::{
    SESSION_COOKIE_NAME, SessionCookie, clear_session_cookie, session_cookie,
    session_token_from_headers,
};
