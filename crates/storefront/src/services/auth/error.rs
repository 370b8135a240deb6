//! Authentication error types.

use thiserror::Error;

use super::validation::FieldError;
use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Submitted form data failed validation.
    #[error("validation failed: {} field error(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// Email or username already registered.
    #[error("{message}")]
    UserAlreadyExists {
        /// The field holding the duplicate value (`email` or `username`).
        field: &'static str,
        message: String,
    },

    /// Unknown email or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials {
        /// Which half of the credentials failed (`email` or `password`).
        field: &'static str,
    },

    /// Login attempted before the email address was verified.
    #[error("email not verified")]
    EmailNotVerified,

    /// Verification request without a token.
    #[error("verification token is required")]
    MissingToken,

    /// Verification token unknown or expired.
    #[error("invalid or expired verification token")]
    InvalidToken,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// Tried to hash an empty password.
    #[error("password cannot be empty")]
    EmptyPassword,

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for AuthError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict { field, message } => {
                Self::UserAlreadyExists { field, message }
            }
            other => Self::Repository(other),
        }
    }
}
