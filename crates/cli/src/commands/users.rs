//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! mp-cli users list
//! mp-cli users verify -e user@example.com
//! mp-cli users delete -e user@example.com
//! ```

use marketplace_core::Email;
use marketplace_storefront::db::{
    JsonStore, RepositoryError, SessionRepository, UserRepository, VerificationTokenRepository,
};
use marketplace_storefront::models::User;
use thiserror::Error;

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UsersError {
    /// Storage failure.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// No user with that email.
    #[error("No user with email: {0}")]
    NotFound(String),
}

/// What went with a deleted user.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeleteReport {
    pub sessions: usize,
    pub verification_tokens: usize,
}

/// All users, oldest first.
///
/// # Errors
///
/// Returns `UsersError::Repository` for storage failures.
pub async fn list(store: &JsonStore) -> Result<Vec<User>, UsersError> {
    let mut users = UserRepository::new(store).list().await?;
    users.sort_by_key(|user| user.created_at);
    Ok(users)
}

/// Print users as a plain table on stdout.
#[allow(clippy::print_stdout)]
pub fn print_table(users: &[User]) {
    println!("{:<36}  {:<32}  {:<20}  VERIFIED", "ID", "EMAIL", "USERNAME");
    for user in users {
        println!(
            "{:<36}  {:<32}  {:<20}  {}",
            user.id,
            user.email,
            user.username,
            user.email_verified
                .map_or_else(|| "no".to_owned(), |at| at.format("%Y-%m-%d").to_string())
        );
    }
    println!("{} user(s)", users.len());
}

/// Mark the user with `email` as verified and drop their outstanding tokens.
///
/// # Errors
///
/// Returns `UsersError::InvalidEmail` if `email` is malformed.
/// Returns `UsersError::NotFound` if no user has that email.
pub async fn verify(store: &JsonStore, email: &str) -> Result<User, UsersError> {
    let user = find(store, email).await?;

    let user = UserRepository::new(store)
        .verify_email(user.id)
        .await?
        .ok_or_else(|| UsersError::NotFound(email.to_owned()))?;

    VerificationTokenRepository::new(store)
        .delete_for_user(user.id)
        .await?;

    Ok(user)
}

/// Delete the user with `email` along with their sessions and tokens.
///
/// # Errors
///
/// Returns `UsersError::InvalidEmail` if `email` is malformed.
/// Returns `UsersError::NotFound` if no user has that email.
pub async fn delete(store: &JsonStore, email: &str) -> Result<DeleteReport, UsersError> {
    let user = find(store, email).await?;

    let report = DeleteReport {
        sessions: SessionRepository::new(store)
            .delete_for_user(user.id)
            .await?,
        verification_tokens: VerificationTokenRepository::new(store)
            .delete_for_user(user.id)
            .await?,
    };

    if !UserRepository::new(store).delete(user.id).await? {
        return Err(UsersError::NotFound(email.to_owned()));
    }

    Ok(report)
}

async fn find(store: &JsonStore, email: &str) -> Result<User, UsersError> {
    let email = Email::parse(email).map_err(|_| UsersError::InvalidEmail(email.to_owned()))?;

    UserRepository::new(store)
        .get_by_email(email.as_str())
        .await?
        .ok_or_else(|| UsersError::NotFound(email.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use marketplace_storefront::models::NewUser;

    async fn create_user(store: &JsonStore, email: &str, username: &str) -> User {
        UserRepository::new(store)
            .create(NewUser {
                email: Email::parse(email).unwrap(),
                password_hash: "not-a-real-hash".to_owned(),
                name: "Test User".to_owned(),
                username: username.to_owned(),
                phone: None,
                country: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_verify_marks_user_and_drops_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let user = create_user(&store, "jane@example.com", "jane").await;
        let tokens = VerificationTokenRepository::new(&store);
        let (token, _) = tokens.create(user.id).await.unwrap();

        let verified = verify(&store, "JANE@example.com").await.unwrap();

        assert!(verified.is_verified());
        assert!(tokens.verify(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_removes_everything_for_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let jane = create_user(&store, "jane@example.com", "jane").await;
        let john = create_user(&store, "john@example.com", "john").await;

        let sessions = SessionRepository::new(&store);
        sessions.create(jane.id, TimeDelta::hours(1)).await.unwrap();
        sessions.create(jane.id, TimeDelta::hours(1)).await.unwrap();
        let johns = sessions.create(john.id, TimeDelta::hours(1)).await.unwrap();
        VerificationTokenRepository::new(&store)
            .create(jane.id)
            .await
            .unwrap();

        let report = delete(&store, "jane@example.com").await.unwrap();

        assert_eq!(
            report,
            DeleteReport {
                sessions: 2,
                verification_tokens: 1
            }
        );
        let remaining = list(&store).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining.first().unwrap().id, john.id);
        assert!(sessions.get_by_token(&johns.token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unknown_and_invalid_email() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());

        assert!(matches!(
            verify(&store, "nobody@example.com").await,
            Err(UsersError::NotFound(_))
        ));
        assert!(matches!(
            delete(&store, "not-an-email").await,
            Err(UsersError::InvalidEmail(_))
        ));
    }
}
