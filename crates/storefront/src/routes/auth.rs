//! Authentication route handlers.
//!
//! JSON endpoints for signup, login, logout, email verification and the
//! current session. Each attempt-sensitive action is counted against the
//! client before the request body is parsed or validated, so malformed
//! bodies spend attempts too.

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use marketplace_core::UserId;

use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::session::append_set_cookie;
use crate::middleware::{ClientId, RequireAuth, SessionCookie, clear_session_cookie, session_cookie};
use crate::models::{PublicUser, SessionData};
use crate::services::auth::{AuthError, LoginRequest, SignupRequest};
use crate::services::rate_limit::RateLimitAction;
use crate::state::AppState;

const SIGNUP_SUCCESS: &str =
    "User created successfully. Please check your email to verify your account.";
const LOGIN_SUCCESS: &str = "Login successful";
const LOGOUT_SUCCESS: &str = "Logged out successfully";
const VERIFY_SUCCESS: &str = "Email verified successfully. You can now log in.";

// =============================================================================
// Response Types
// =============================================================================

/// Body returned after a successful signup.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub message: String,
    pub user_id: UserId,
}

/// Body returned after a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: PublicUser,
}

/// Body returned after a successful email verification.
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub message: String,
    pub success: bool,
}

/// Body carrying only a message.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Query parameters for the verification link.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyQuery {
    pub token: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Count an attempt at `action` and refuse it once the window is spent.
fn enforce_rate_limit(state: &AppState, action: RateLimitAction, client: &str) -> Result<()> {
    let result = state.rate_limiter().check(action, client);

    if result.success {
        Ok(())
    } else {
        Err(AppError::RateLimited {
            action,
            retry_after_minutes: result.retry_after_minutes(Utc::now()),
        })
    }
}

/// Register a new account.
///
/// There is no mail transport; the verification link is written to the log.
#[tracing::instrument(skip_all, fields(client = %client))]
pub async fn signup(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    payload: std::result::Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SignupResponse>)> {
    enforce_rate_limit(&state, RateLimitAction::Signup, &client)?;
    let Json(request) = payload?;

    let outcome = state.auth().signup(request).await?;
    let verification_url = state.config().verification_url(&outcome.verification_token);

    tracing::info!(
        user_id = %outcome.user.id,
        email = %outcome.user.email,
        %verification_url,
        "verification link issued"
    );

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: SIGNUP_SUCCESS.to_owned(),
            user_id: outcome.user.id,
        }),
    ))
}

/// Log in with email and password and set the session cookie.
#[tracing::instrument(skip_all, fields(client = %client))]
pub async fn login(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response> {
    enforce_rate_limit(&state, RateLimitAction::Login, &client)?;
    let Json(request) = payload?;

    let (user, session) = state.auth().login(request).await?;

    set_sentry_user(&user.id, Some(user.email.as_str()));
    add_breadcrumb("auth", "User logged in", None);

    let mut headers = HeaderMap::new();
    append_set_cookie(
        &mut headers,
        &session_cookie(
            &session.token,
            session.expires_at,
            state.config().secure_cookies(),
        ),
    );

    let body = Json(LoginResponse {
        message: LOGIN_SUCCESS.to_owned(),
        user: user.to_public(),
    });

    Ok((headers, body).into_response())
}

/// End the current session. The cookie is cleared even without a session.
pub async fn logout(
    State(state): State<AppState>,
    SessionCookie(token): SessionCookie,
) -> Result<Response> {
    if state.auth().logout(token.as_deref()).await? {
        add_breadcrumb("auth", "User logged out", None);
    }
    clear_sentry_user();

    let mut headers = HeaderMap::new();
    append_set_cookie(
        &mut headers,
        &clear_session_cookie(state.config().secure_cookies()),
    );

    let body = Json(MessageResponse {
        message: LOGOUT_SUCCESS.to_owned(),
    });

    Ok((headers, body).into_response())
}

/// Consume a verification link.
#[tracing::instrument(skip_all, fields(client = %client))]
pub async fn verify(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    query: std::result::Result<Query<VerifyQuery>, QueryRejection>,
) -> Result<Json<VerifyResponse>> {
    let Query(query) = query?;
    let token = query
        .token
        .filter(|token| !token.trim().is_empty())
        .ok_or(AuthError::MissingToken)?;

    enforce_rate_limit(&state, RateLimitAction::Verify, &client)?;

    state.auth().verify_email(&token).await?;

    Ok(Json(VerifyResponse {
        message: VERIFY_SUCCESS.to_owned(),
        success: true,
    }))
}

/// The signed-in user's session.
pub async fn session(RequireAuth(session): RequireAuth) -> Json<SessionData> {
    Json(session)
}
