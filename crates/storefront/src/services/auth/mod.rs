//! Authentication service.
//!
//! Password signup and login, email verification, and cookie-backed
//! sessions. Argon2 work runs on the blocking thread pool so a login burst
//! cannot stall the async runtime.

mod error;
pub mod password;
pub mod tokens;
pub mod validation;

pub use error::AuthError;
pub use validation::{FieldError, LoginRequest, SignupRequest};

use chrono::TimeDelta;
use secrecy::{ExposeSecret, SecretString};

use marketplace_core::Email;

use crate::db::users::{EMAIL_TAKEN, USERNAME_TAKEN};
use crate::db::{JsonStore, SessionRepository, UserRepository, VerificationTokenRepository};
use crate::models::{NewUser, Session, SessionData, User};

/// A freshly registered user and the plain token for their verification link.
#[derive(Debug)]
pub struct SignupOutcome {
    pub user: User,
    pub verification_token: String,
}

/// Authentication service.
///
/// Cheap to construct; build one per request from the shared store.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    sessions: SessionRepository<'a>,
    tokens: VerificationTokenRepository<'a>,
    session_ttl: TimeDelta,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a JsonStore, session_ttl: TimeDelta) -> Self {
        Self {
            users: UserRepository::new(store),
            sessions: SessionRepository::new(store),
            tokens: VerificationTokenRepository::new(store),
            session_ttl,
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a new, unverified user and issue a verification token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if any field is invalid.
    /// Returns `AuthError::UserAlreadyExists` if the email or username is taken.
    /// Returns `AuthError::Repository` or `AuthError::PasswordHash` on
    /// internal failures.
    pub async fn signup(&self, request: SignupRequest) -> Result<SignupOutcome, AuthError> {
        let errors = validation::validate_signup(&request);
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }

        let email = Email::parse(&request.email).map_err(|_| {
            AuthError::Validation(vec![FieldError::new("email", validation::EMAIL_INVALID)])
        })?;

        // Fail fast before paying for a hash; `create` re-checks under the lock
        if self.users.get_by_email(email.as_str()).await?.is_some() {
            return Err(AuthError::UserAlreadyExists {
                field: "email",
                message: EMAIL_TAKEN.to_owned(),
            });
        }
        if self.users.get_by_username(&request.username).await?.is_some() {
            return Err(AuthError::UserAlreadyExists {
                field: "username",
                message: USERNAME_TAKEN.to_owned(),
            });
        }

        let password_hash = hash_password_blocking(SecretString::from(request.password)).await?;

        let user = self
            .users
            .create(NewUser {
                email,
                password_hash,
                name: request.name,
                username: request.username,
                phone: request.phone,
                country: request.country,
            })
            .await?;

        let (verification_token, _) = self.tokens.create(user.id).await?;

        tracing::info!(user_id = %user.id, "user registered");

        Ok(SignupOutcome {
            user,
            verification_token,
        })
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Login with email and password, opening a new session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the email or password is missing.
    /// Returns `AuthError::InvalidCredentials` if the email is unknown or the
    /// password is wrong.
    /// Returns `AuthError::EmailNotVerified` if the account is unverified.
    pub async fn login(&self, request: LoginRequest) -> Result<(User, Session), AuthError> {
        let errors = validation::validate_login(&request);
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }

        let user = self
            .users
            .get_by_email(&request.email)
            .await?
            .ok_or(AuthError::InvalidCredentials { field: "email" })?;

        let password = SecretString::from(request.password);
        if !verify_password_blocking(user.password_hash.clone(), password).await {
            return Err(AuthError::InvalidCredentials { field: "password" });
        }

        if !user.is_verified() {
            return Err(AuthError::EmailNotVerified);
        }

        let session = self.sessions.create(user.id, self.session_ttl).await?;

        tracing::info!(user_id = %user.id, session_id = %session.id, "user logged in");

        Ok((user, session))
    }

    /// End the session behind `token`, if there is one.
    ///
    /// Returns `true` if a live session was deleted.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` on storage failures.
    pub async fn logout(&self, token: Option<&str>) -> Result<bool, AuthError> {
        let Some(token) = token else {
            return Ok(false);
        };

        match self.sessions.get_by_token(token).await? {
            Some(session) => {
                tracing::info!(user_id = %session.user_id, session_id = %session.id, "user logged out");
                Ok(self.sessions.delete(session.id).await?)
            }
            None => Ok(false),
        }
    }

    // =========================================================================
    // Email Verification
    // =========================================================================

    /// Consume a verification token and mark its user verified.
    ///
    /// On success every outstanding token for the user is removed, so a link
    /// works once.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingToken` if `token` is blank.
    /// Returns `AuthError::InvalidToken` if the token is unknown or expired.
    /// Returns `AuthError::UserNotFound` if the user has since been deleted.
    pub async fn verify_email(&self, token: &str) -> Result<User, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::MissingToken);
        }

        let user_id = self
            .tokens
            .verify(token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let user = self
            .users
            .verify_email(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let removed = self.tokens.delete_for_user(user_id).await?;

        tracing::info!(user_id = %user.id, tokens_removed = removed, "email verified");

        Ok(user)
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Resolve a session cookie token to the session and its user.
    ///
    /// Returns `None` for unknown or expired tokens, and for sessions whose
    /// user no longer exists.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` on storage failures.
    pub async fn current_session(&self, token: &str) -> Result<Option<SessionData>, AuthError> {
        let Some(session) = self.sessions.get_by_token(token).await? else {
            return Ok(None);
        };

        let Some(user) = self.users.get_by_id(session.user_id).await? else {
            return Ok(None);
        };

        Ok(Some(SessionData {
            session_id: session.id,
            user_id: user.id,
            user: user.to_public(),
        }))
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: marketplace_core::UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

/// Hash a password on the blocking pool.
async fn hash_password_blocking(password: SecretString) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || password::hash_password(password.expose_secret()))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing task failed");
            AuthError::PasswordHash
        })?
}

/// Verify a password on the blocking pool. A failed task counts as a mismatch.
async fn verify_password_blocking(hash: String, password: SecretString) -> bool {
    tokio::task::spawn_blocking(move || password::verify_password(&hash, password.expose_secret()))
        .await
        .unwrap_or(false)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PASSWORD: &str = "Str0ng!Pass";

    fn signup_request(email: &str, username: &str) -> SignupRequest {
        SignupRequest {
            email: email.to_owned(),
            password: PASSWORD.to_owned(),
            confirm_password: PASSWORD.to_owned(),
            name: "Test User".to_owned(),
            username: username.to_owned(),
            phone: None,
            country: Some("US".to_owned()),
        }
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_owned(),
            password: password.to_owned(),
        }
    }

    fn service(store: &JsonStore) -> AuthService<'_> {
        AuthService::new(store, TimeDelta::hours(1))
    }

    #[tokio::test]
    async fn test_signup_verify_login_logout() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let auth = service(&store);

        let outcome = auth
            .signup(signup_request("new@example.com", "newbie"))
            .await
            .unwrap();
        assert!(!outcome.user.is_verified());
        assert_ne!(outcome.user.password_hash, PASSWORD);

        let err = auth
            .login(login_request("new@example.com", PASSWORD))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailNotVerified));

        let verified = auth.verify_email(&outcome.verification_token).await.unwrap();
        assert!(verified.is_verified());

        // Single use
        let err = auth
            .verify_email(&outcome.verification_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));

        let (user, session) = auth
            .login(login_request("NEW@example.com", PASSWORD))
            .await
            .unwrap();
        assert_eq!(user.id, outcome.user.id);

        let data = auth.current_session(&session.token).await.unwrap().unwrap();
        assert_eq!(data.user_id, user.id);
        assert_eq!(data.session_id, session.id);
        assert_eq!(data.user.username, "newbie");

        assert!(auth.logout(Some(&session.token)).await.unwrap());
        assert!(auth.current_session(&session.token).await.unwrap().is_none());
        assert!(!auth.logout(Some(&session.token)).await.unwrap());
        assert!(!auth.logout(None).await.unwrap());
    }

    #[tokio::test]
    async fn test_signup_rejects_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let auth = service(&store);

        let mut request = signup_request("bad-email", "ok_name");
        request.confirm_password = "Mismatch1!".to_owned();

        match auth.signup(request).await.unwrap_err() {
            AuthError::Validation(errors) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["email", "confirmPassword"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_signup_conflicts_are_typed() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let auth = service(&store);

        auth.signup(signup_request("dup@example.com", "first"))
            .await
            .unwrap();

        let err = auth
            .signup(signup_request("DUP@example.com", "second"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists { field: "email", .. }));

        let err = auth
            .signup(signup_request("other@example.com", "FIRST"))
            .await
            .unwrap_err();
        match err {
            AuthError::UserAlreadyExists { field, message } => {
                assert_eq!(field, "username");
                assert_eq!(message, USERNAME_TAKEN);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_login_failures_name_the_field() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let auth = service(&store);

        auth.signup(signup_request("who@example.com", "who"))
            .await
            .unwrap();

        let err = auth
            .login(login_request("nobody@example.com", PASSWORD))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials { field: "email" }));

        let err = auth
            .login(login_request("who@example.com", "Wr0ng!Pass"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials { field: "password" }));

        let err = auth.login(login_request("", "")).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(ref errors) if errors.len() == 2));
    }

    #[tokio::test]
    async fn test_verify_email_token_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let auth = service(&store);

        assert!(matches!(
            auth.verify_email("  ").await.unwrap_err(),
            AuthError::MissingToken
        ));
        assert!(matches!(
            auth.verify_email("no-such-token").await.unwrap_err(),
            AuthError::InvalidToken
        ));
    }

    #[tokio::test]
    async fn test_verify_email_for_deleted_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let auth = service(&store);

        let outcome = auth
            .signup(signup_request("gone@example.com", "gone"))
            .await
            .unwrap();
        UserRepository::new(&store)
            .delete(outcome.user.id)
            .await
            .unwrap();

        let err = auth
            .verify_email(&outcome.verification_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
    }
}
