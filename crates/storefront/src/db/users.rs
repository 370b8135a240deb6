//! User repository.
//!
//! Email and username lookups ignore case, and uniqueness is enforced the
//! same way when a user is created.

use chrono::Utc;

use marketplace_core::UserId;

use super::{JsonStore, RepositoryError, collections};
use crate::models::user::{NewUser, User};

/// Conflict message for a duplicate email address.
pub const EMAIL_TAKEN: &str = "A user with this email already exists";
/// Conflict message for a duplicate username.
pub const USERNAME_TAKEN: &str = "A user with this username already exists";

/// Repository for user records.
pub struct UserRepository<'a> {
    store: &'a JsonStore,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(store: &'a JsonStore) -> Self {
        Self { store }
    }

    /// Get a user by email address, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the collection cannot be read.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        self.store
            .find(collections::USERS, |user: &User| user.email.matches(email))
            .await
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the collection cannot be read.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.store
            .find(collections::USERS, |user: &User| user.id == id)
            .await
    }

    /// Get a user by username, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the collection cannot be read.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let wanted = username.to_lowercase();
        self.store
            .find(collections::USERS, |user: &User| {
                user.username.to_lowercase() == wanted
            })
            .await
    }

    /// List every user in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the collection cannot be read.
    pub async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        self.store.read(collections::USERS).await
    }

    /// Create a new, unverified user.
    ///
    /// The email is checked before the username, so a request clashing on
    /// both reports the email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email or username is taken.
    /// Returns `RepositoryError` for storage failures.
    pub async fn create(&self, new_user: NewUser) -> Result<User, RepositoryError> {
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            name: new_user.name,
            username: new_user.username,
            phone: new_user.phone,
            country: new_user.country,
            email_verified: None,
            created_at: now,
            updated_at: now,
        };

        let email = user.email.clone();
        let username = user.username.to_lowercase();

        self.store
            .insert_unique(collections::USERS, user, |existing: &[User]| {
                if existing.iter().any(|u| u.email.matches(email.as_str())) {
                    return Some(RepositoryError::Conflict {
                        field: "email",
                        message: EMAIL_TAKEN.to_owned(),
                    });
                }
                if existing.iter().any(|u| u.username.to_lowercase() == username) {
                    return Some(RepositoryError::Conflict {
                        field: "username",
                        message: USERNAME_TAKEN.to_owned(),
                    });
                }
                None
            })
            .await
    }

    /// Apply `patch` to a user and stamp `updatedAt`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` for storage failures.
    pub async fn update<F>(&self, id: UserId, patch: F) -> Result<Option<User>, RepositoryError>
    where
        F: FnOnce(&mut User),
    {
        self.store
            .update(collections::USERS, |user: &User| user.id == id, patch)
            .await
    }

    /// Mark a user's email as verified now.
    ///
    /// Returns `None` if the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` for storage failures.
    pub async fn verify_email(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.update(id, |user| user.email_verified = Some(Utc::now()))
            .await
    }

    /// Delete a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` for storage failures.
    pub async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        self.store
            .delete(collections::USERS, |user: &User| user.id == id)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use marketplace_core::Email;

    fn new_user(email: &str, username: &str) -> NewUser {
        NewUser {
            email: Email::parse(email).unwrap(),
            password_hash: "hash".to_owned(),
            name: "Test User".to_owned(),
            username: username.to_owned(),
            phone: None,
            country: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let users = UserRepository::new(&store);

        let user = users
            .create(new_user("Jane@Example.com", "JaneDoe"))
            .await
            .unwrap();
        assert!(!user.is_verified());
        assert_eq!(user.created_at, user.updated_at);

        let by_email = users.get_by_email("jane@example.com").await.unwrap();
        assert_eq!(by_email.unwrap().id, user.id);

        let by_username = users.get_by_username("janedoe").await.unwrap();
        assert_eq!(by_username.unwrap().id, user.id);

        let by_id = users.get_by_id(user.id).await.unwrap();
        assert_eq!(by_id.unwrap().email.as_str(), "Jane@Example.com");

        assert!(users.get_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_a_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let users = UserRepository::new(&store);

        users.create(new_user("a@example.com", "alpha")).await.unwrap();
        let err = users
            .create(new_user("A@EXAMPLE.COM", "beta"))
            .await
            .unwrap_err();

        match err {
            RepositoryError::Conflict { field, message } => {
                assert_eq!(field, "email");
                assert_eq!(message, EMAIL_TAKEN);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_is_a_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let users = UserRepository::new(&store);

        users.create(new_user("a@example.com", "alpha")).await.unwrap();
        let err = users
            .create(new_user("b@example.com", "ALPHA"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RepositoryError::Conflict {
                field: "username",
                ..
            }
        ));
        assert_eq!(users.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_verify_email_sets_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let users = UserRepository::new(&store);

        let user = users.create(new_user("a@example.com", "alpha")).await.unwrap();
        let verified = users.verify_email(user.id).await.unwrap().unwrap();

        assert!(verified.is_verified());
        assert!(verified.updated_at >= user.updated_at);
        assert!(users.verify_email(UserId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let users = UserRepository::new(&store);

        let user = users.create(new_user("a@example.com", "alpha")).await.unwrap();
        assert!(users.delete(user.id).await.unwrap());
        assert!(!users.delete(user.id).await.unwrap());
        assert!(users.get_by_id(user.id).await.unwrap().is_none());
    }
}
