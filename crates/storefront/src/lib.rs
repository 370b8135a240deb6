//! Marketplace storefront library.
//!
//! This crate provides the storefront functionality as a library,
//! allowing it to be tested and reused.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, http::Request};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the application router with tracing, request IDs and Sentry.
///
/// The per-IP token bucket is left out so the router can be driven
/// in-process; see [`app_with_rate_limit`].
pub fn app(state: AppState) -> Router {
    routes::routes()
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// [`app`] behind the per-IP API rate limiter.
///
/// Must be served with `into_make_service_with_connect_info::<SocketAddr>()`
/// so clients without proxy headers can still be keyed.
pub fn app_with_rate_limit(state: AppState) -> Router {
    app(state).layer(middleware::api_rate_limiter())
}
