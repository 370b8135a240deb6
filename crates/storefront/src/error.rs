//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Responses are JSON. Field-level problems use
//! `{"errors": [{"field": ..., "message": ...}]}` so forms can place each
//! message next to its input; everything else uses `{"error": ...}`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::db::RepositoryError;
use crate::services::auth::{AuthError, FieldError};
use crate::services::rate_limit::RateLimitAction;

/// Message for both an unknown email and a wrong password.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
/// Message for a login before email verification.
pub const EMAIL_NOT_VERIFIED: &str =
    "Please verify your email before logging in. Check your inbox for the verification link.";
const INTERNAL: &str = "Internal server error";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Listing query could not be parsed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Too many attempts at an auth action.
    #[error("Rate limited: {}", .action.label())]
    RateLimited {
        action: RateLimitAction,
        retry_after_minutes: i64,
    },

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::Validation(_)
                | AuthError::MissingToken
                | AuthError::InvalidToken
                | AuthError::EmptyPassword => StatusCode::BAD_REQUEST,
                AuthError::UserAlreadyExists { .. } => StatusCode::CONFLICT,
                AuthError::InvalidCredentials { .. } => StatusCode::UNAUTHORIZED,
                AuthError::EmailNotVerified => StatusCode::FORBIDDEN,
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::PasswordHash | AuthError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Catalog(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Auth(AuthError::PasswordHash | AuthError::Repository(_))
        )
    }

    fn body(&self) -> serde_json::Value {
        // Don't expose internal error details to clients
        if self.is_server_error() {
            return json!({ "error": INTERNAL });
        }

        match self {
            Self::Auth(err) => match err {
                AuthError::Validation(errors) => json!({ "errors": errors }),
                AuthError::UserAlreadyExists { field, message } => {
                    field_errors(field, message)
                }
                AuthError::InvalidCredentials { field } => {
                    field_errors(field, INVALID_CREDENTIALS)
                }
                AuthError::EmailNotVerified => field_errors("email", EMAIL_NOT_VERIFIED),
                AuthError::MissingToken => json!({ "error": "Verification token is required" }),
                AuthError::InvalidToken => {
                    json!({ "error": "Invalid or expired verification token" })
                }
                AuthError::UserNotFound => json!({ "error": "User not found" }),
                other => json!({ "error": other.to_string() }),
            },
            Self::RateLimited {
                action,
                retry_after_minutes,
            } => field_errors(
                "general",
                &format!(
                    "Too many {} attempts. Please try again in {retry_after_minutes} minutes.",
                    action.label()
                ),
            ),
            Self::Catalog(err) => json!({ "error": err.to_string() }),
            Self::NotFound(msg) | Self::Unauthorized(msg) | Self::BadRequest(msg) => {
                json!({ "error": msg })
            }
            Self::Database(_) | Self::Internal(_) => json!({ "error": INTERNAL }),
        }
    }
}

fn field_errors(field: &str, message: &str) -> serde_json::Value {
    json!({ "errors": [FieldError::new(field, message)] })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let mut response = (self.status(), Json(self.body())).into_response();

        if let Self::RateLimited {
            retry_after_minutes,
            ..
        } = self
        {
            response.headers_mut().insert(
                header::RETRY_AFTER,
                HeaderValue::from(retry_after_minutes * 60),
            );
        }

        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("auth", "User signed up", Some(&[("user_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
