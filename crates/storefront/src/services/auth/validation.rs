//! Signup and login input validation.
//!
//! Validation collects every problem rather than stopping at the first one,
//! and tags each with the form field it belongs to.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use marketplace_core::Email;

pub const EMAIL_REQUIRED: &str = "Email is required";
pub const EMAIL_INVALID: &str = "Invalid email format";
pub const PASSWORD_REQUIRED: &str = "Password is required";
pub const PASSWORD_WEAK: &str = "Password must be at least 8 characters and contain uppercase, lowercase, number, and special character";
pub const PASSWORDS_DO_NOT_MATCH: &str = "Passwords do not match";
pub const NAME_REQUIRED: &str = "Name is required";
pub const NAME_TOO_SHORT: &str = "Name must be at least 2 characters";
pub const USERNAME_REQUIRED: &str = "Username is required";
pub const USERNAME_INVALID: &str = "Username must be 3-20 characters, start with a letter, and contain only letters, numbers, and underscores";

const MIN_PASSWORD_LENGTH: usize = 8;
const MIN_NAME_LENGTH: usize = 2;
const USERNAME_LENGTH: std::ops::RangeInclusive<usize> = 3..=20;

/// Characters that count as "special" for password strength.
const PASSWORD_SPECIALS: &str = "!@#$%^&*(),.?\":{}|<>";

static USERNAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9_]*$").expect("username pattern is a valid regex")
});

/// A validation problem tied to a form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Signup request body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub name: String,
    pub username: String,
    pub phone: Option<String>,
    pub country: Option<String>,
}

/// Login request body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Whether `email` has the `local@domain.tld` shape.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    Email::parse(email).is_ok()
}

/// Whether `password` is at least 8 characters and mixes uppercase,
/// lowercase, digits and one of `!@#$%^&*(),.?":{}|<>`.
#[must_use]
pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}

/// Whether `username` is 3-20 characters, starts with a letter, and
/// continues with letters, digits or underscores.
#[must_use]
pub fn is_valid_username(username: &str) -> bool {
    USERNAME_LENGTH.contains(&username.chars().count()) && USERNAME_PATTERN.is_match(username)
}

/// Validate a signup request. An empty list means the request is valid.
#[must_use]
pub fn validate_signup(request: &SignupRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if let Some(err) = check_email(&request.email) {
        errors.push(err);
    }

    if request.password.is_empty() {
        errors.push(FieldError::new("password", PASSWORD_REQUIRED));
    } else if !is_valid_password(&request.password) {
        errors.push(FieldError::new("password", PASSWORD_WEAK));
    }

    if request.password != request.confirm_password {
        errors.push(FieldError::new("confirmPassword", PASSWORDS_DO_NOT_MATCH));
    }

    let name = request.name.trim();
    if name.is_empty() {
        errors.push(FieldError::new("name", NAME_REQUIRED));
    } else if name.chars().count() < MIN_NAME_LENGTH {
        errors.push(FieldError::new("name", NAME_TOO_SHORT));
    }

    if request.username.trim().is_empty() {
        errors.push(FieldError::new("username", USERNAME_REQUIRED));
    } else if !is_valid_username(&request.username) {
        errors.push(FieldError::new("username", USERNAME_INVALID));
    }

    errors
}

/// Validate a login request. An empty list means the request is valid.
#[must_use]
pub fn validate_login(request: &LoginRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if let Some(err) = check_email(&request.email) {
        errors.push(err);
    }

    if request.password.is_empty() {
        errors.push(FieldError::new("password", PASSWORD_REQUIRED));
    }

    errors
}

fn check_email(email: &str) -> Option<FieldError> {
    if email.trim().is_empty() {
        Some(FieldError::new("email", EMAIL_REQUIRED))
    } else if !is_valid_email(email) {
        Some(FieldError::new("email", EMAIL_INVALID))
    } else {
        None
    }
}
