//! Authentication extractors.
//!
//! Resolve the session cookie against the session collection for route
//! handlers that need a signed-in user.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::{AppError, set_sentry_user};
use crate::models::SessionData;
use crate::state::AppState;

use super::session::session_token_from_headers;

/// Extractor that requires a live session.
///
/// Rejects with `401 Unauthorized` when the cookie is missing, unknown or
/// expired.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(session): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", session.user.name)
/// }
/// ```
pub struct RequireAuth(pub SessionData);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let OptionalAuth(session) = OptionalAuth::from_request_parts(parts, state).await?;

        session
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

/// Extractor that optionally resolves the current session.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is
/// signed in. Storage failures still surface as errors.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(
///     OptionalAuth(session): OptionalAuth,
/// ) -> impl IntoResponse {
///     match session {
///         Some(s) => format!("Hello, {}!", s.user.name),
///         None => "Hello, guest!".to_string(),
///     }
/// }
/// ```
pub struct OptionalAuth(pub Option<SessionData>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token_from_headers(&parts.headers) else {
            return Ok(Self(None));
        };

        let session = state.auth().current_session(&token).await?;

        if let Some(session) = &session {
            tracing::Span::current().record("user_id", tracing::field::display(session.user_id));
            set_sentry_user(&session.user_id, Some(session.user.email.as_str()));
        }

        Ok(Self(session))
    }
}
