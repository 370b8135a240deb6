//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (data directory writable)
//!
//! # Auth
//! POST /api/auth/signup        - Register (JSON body)
//! POST /api/auth/login         - Log in, sets the session cookie
//! POST /api/auth/logout        - Log out, clears the session cookie
//! GET  /api/auth/verify        - Consume a verification link (?token=)
//! GET  /api/auth/session       - Current session (requires auth)
//!
//! # Catalog
//! GET  /api/products           - Listing (?category=&q=&sort=&page=&per_page=)
//! GET  /api/products/{id}      - Product detail (requires auth)
//! GET  /api/categories         - Category list
//! ```

pub mod auth;
pub mod products;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/verify", get(auth::verify))
        .route("/session", get(auth::session))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the health check router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health))
        .route("/ready", get(readiness))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/health", health_routes())
        .nest("/api/auth", auth_routes())
        .nest("/api/products", product_routes())
        .route("/api/categories", get(products::categories))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the data directory cannot be written.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.store().is_writable().await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
