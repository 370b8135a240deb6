//! Flat-file persistence for storefront records.
//!
//! # Data directory (default `mockdb/`)
//!
//! Each collection is a single pretty-printed JSON array:
//!
//! ## Collections
//!
//! - `users.json` - Registered accounts
//! - `sessions.json` - Login sessions (cookie tokens)
//! - `verificationTokens.json` - Email verification token digests
//!
//! Every mutation loads the whole collection, changes it, and rewrites the
//! file. Mutations hold a store-wide lock and replace files through a rename,
//! so writers in one process never lose each other's updates and readers
//! never observe a half-written file. Separate processes sharing a data
//! directory are not coordinated.

pub mod sessions;
pub mod users;
pub mod verification_tokens;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tokio::sync::Mutex;

pub use sessions::SessionRepository;
pub use users::UserRepository;
pub use verification_tokens::VerificationTokenRepository;

/// Collection names. Each maps to `<data_dir>/<name>.json`.
pub mod collections {
    pub const USERS: &str = "users";
    pub const SESSIONS: &str = "sessions";
    pub const VERIFICATION_TOKENS: &str = "verificationTokens";
}

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Reading or writing a collection file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A collection could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Record not found.
    #[error("record not found")]
    NotFound,

    /// A uniqueness constraint would be violated.
    #[error("{message}")]
    Conflict {
        /// The field holding the duplicate value.
        field: &'static str,
        /// Human-readable description of the conflict.
        message: String,
    },

    /// A collection file exists but does not hold valid records.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// A record that can be stored in a collection.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Hook run after [`JsonStore::update`] patches the record.
    ///
    /// Records with an `updatedAt` field stamp it here.
    fn touch(&mut self, _now: DateTime<Utc>) {}
}

/// Whole-file JSON collection store rooted at a data directory.
#[derive(Debug)]
pub struct JsonStore {
    data_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonStore {
    /// Create a store rooted at `data_dir`. The directory is created lazily.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// The directory holding the collection files.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Create the data directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Io` if the directory cannot be created.
    pub async fn ensure_data_dir(&self) -> Result<(), RepositoryError> {
        tokio::fs::create_dir_all(&self.data_dir).await?;
        Ok(())
    }

    /// Whether the data directory exists and accepts writes.
    pub async fn is_writable(&self) -> bool {
        match tokio::fs::metadata(&self.data_dir).await {
            Ok(meta) => meta.is_dir() && !meta.permissions().readonly(),
            Err(_) => false,
        }
    }

    // =========================================================================
    // Whole-collection operations
    // =========================================================================

    /// Read every record in a collection.
    ///
    /// A missing file is an empty collection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Io` for read failures other than not-found.
    /// Returns `RepositoryError::DataCorruption` if the file is not a JSON
    /// array of records.
    pub async fn read<T: Record>(&self, collection: &str) -> Result<Vec<T>, RepositoryError> {
        self.load(collection).await
    }

    /// Replace a collection with `records`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Io` or `RepositoryError::Serialization` if
    /// the file cannot be written.
    pub async fn write<T: Record>(
        &self,
        collection: &str,
        records: &[T],
    ) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        self.save(collection, records).await
    }

    // =========================================================================
    // Point operations
    // =========================================================================

    /// Find the first record matching `predicate`.
    ///
    /// # Errors
    ///
    /// Propagates read errors from [`JsonStore::read`].
    pub async fn find<T, P>(&self, collection: &str, predicate: P) -> Result<Option<T>, RepositoryError>
    where
        T: Record,
        P: Fn(&T) -> bool,
    {
        let records: Vec<T> = self.load(collection).await?;
        Ok(records.into_iter().find(|record| predicate(record)))
    }

    /// Append a record.
    ///
    /// # Errors
    ///
    /// Propagates read and write errors.
    pub async fn insert<T: Record>(&self, collection: &str, record: T) -> Result<T, RepositoryError> {
        self.insert_unique(collection, record, |_| None).await
    }

    /// Append a record unless `conflict` reports a clash with the existing
    /// records.
    ///
    /// The check and the append happen under the store lock, so two
    /// concurrent inserts cannot both pass the check.
    ///
    /// # Errors
    ///
    /// Returns the `RepositoryError::Conflict` produced by `conflict`.
    /// Propagates read and write errors.
    pub async fn insert_unique<T, C>(
        &self,
        collection: &str,
        record: T,
        conflict: C,
    ) -> Result<T, RepositoryError>
    where
        T: Record,
        C: FnOnce(&[T]) -> Option<RepositoryError>,
    {
        let _guard = self.write_lock.lock().await;
        let mut records: Vec<T> = self.load(collection).await?;

        if let Some(err) = conflict(&records) {
            return Err(err);
        }

        records.push(record.clone());
        self.save(collection, &records).await?;
        Ok(record)
    }

    /// Patch the first record matching `predicate` and stamp it via
    /// [`Record::touch`].
    ///
    /// Returns the updated record, or `None` if nothing matched.
    ///
    /// # Errors
    ///
    /// Propagates read and write errors.
    pub async fn update<T, P, F>(
        &self,
        collection: &str,
        predicate: P,
        patch: F,
    ) -> Result<Option<T>, RepositoryError>
    where
        T: Record,
        P: Fn(&T) -> bool,
        F: FnOnce(&mut T),
    {
        let _guard = self.write_lock.lock().await;
        let mut records: Vec<T> = self.load(collection).await?;

        let Some(record) = records.iter_mut().find(|record| predicate(record)) else {
            return Ok(None);
        };

        patch(record);
        record.touch(Utc::now());
        let updated = record.clone();

        self.save(collection, &records).await?;
        Ok(Some(updated))
    }

    /// Delete every record matching `predicate`.
    ///
    /// Returns `true` if at least one record was removed.
    ///
    /// # Errors
    ///
    /// Propagates read and write errors.
    pub async fn delete<T, P>(&self, collection: &str, predicate: P) -> Result<bool, RepositoryError>
    where
        T: Record,
        P: Fn(&T) -> bool,
    {
        Ok(self.delete_where(collection, predicate).await? > 0)
    }

    /// Delete every record matching `predicate` and return how many went.
    ///
    /// The file is only rewritten when something was removed.
    ///
    /// # Errors
    ///
    /// Propagates read and write errors.
    pub async fn delete_where<T, P>(
        &self,
        collection: &str,
        predicate: P,
    ) -> Result<usize, RepositoryError>
    where
        T: Record,
        P: Fn(&T) -> bool,
    {
        let _guard = self.write_lock.lock().await;
        let mut records: Vec<T> = self.load(collection).await?;

        let before = records.len();
        records.retain(|record| !predicate(record));
        let removed = before - records.len();

        if removed > 0 {
            self.save(collection, &records).await?;
        }
        Ok(removed)
    }

    // =========================================================================
    // File access
    // =========================================================================

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.data_dir.join(format!("{collection}.json"))
    }

    async fn load<T: Record>(&self, collection: &str) -> Result<Vec<T>, RepositoryError> {
        let path = self.collection_path(collection);

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content)
            .map_err(|e| RepositoryError::DataCorruption(format!("{}: {e}", path.display())))
    }

    /// Caller must hold `write_lock`.
    async fn save<T: Record>(&self, collection: &str, records: &[T]) -> Result<(), RepositoryError> {
        self.ensure_data_dir().await?;

        let path = self.collection_path(collection);
        let tmp_path = self.data_dir.join(format!(".{collection}.json.tmp"));
        let content = serde_json::to_string_pretty(records)?;

        tokio::fs::write(&tmp_path, content).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        tracing::debug!(collection, records = records.len(), "collection written");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Note {
        id: u32,
        body: String,
        updated_at: Option<DateTime<Utc>>,
    }

    impl Record for Note {
        fn touch(&mut self, now: DateTime<Utc>) {
            self.updated_at = Some(now);
        }
    }

    fn note(id: u32, body: &str) -> Note {
        Note {
            id,
            body: body.to_owned(),
            updated_at: None,
        }
    }

    fn store() -> (tempfile::TempDir, JsonStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("db"));
        (dir, store)
    }

    #[tokio::test]
    async fn test_missing_collection_reads_empty() {
        let (_dir, store) = store();
        let notes: Vec<Note> = store.read("notes").await.unwrap();
        assert!(notes.is_empty());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let (_dir, store) = store();
        store
            .write("notes", &[note(1, "a"), note(2, "b")])
            .await
            .unwrap();

        let notes: Vec<Note> = store.read("notes").await.unwrap();
        assert_eq!(notes, vec![note(1, "a"), note(2, "b")]);
    }

    #[tokio::test]
    async fn test_files_are_pretty_printed() {
        let (_dir, store) = store();
        store.write("notes", &[note(1, "a")]).await.unwrap();

        let raw = std::fs::read_to_string(store.data_dir().join("notes.json")).unwrap();
        assert!(raw.starts_with("[\n  {\n    \"id\": 1,"));
        assert!(raw.contains("\"updatedAt\": null"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let (_dir, store) = store();
        store.ensure_data_dir().await.unwrap();
        std::fs::write(store.data_dir().join("notes.json"), "{not json").unwrap();

        let err = store.read::<Note>("notes").await.unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }

    #[tokio::test]
    async fn test_update_patches_and_touches() {
        let (_dir, store) = store();
        store
            .write("notes", &[note(1, "a"), note(2, "b")])
            .await
            .unwrap();

        let updated = store
            .update("notes", |n: &Note| n.id == 2, |n| n.body = "changed".to_owned())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.body, "changed");
        assert!(updated.updated_at.is_some());

        let notes: Vec<Note> = store.read("notes").await.unwrap();
        assert_eq!(notes[0], note(1, "a"));
        assert_eq!(notes[1].body, "changed");
    }

    #[tokio::test]
    async fn test_update_missing_returns_none() {
        let (_dir, store) = store();
        store.write("notes", &[note(1, "a")]).await.unwrap();

        let updated = store
            .update("notes", |n: &Note| n.id == 9, |n| n.body.clear())
            .await
            .unwrap();
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn test_delete_reports_whether_found() {
        let (_dir, store) = store();
        store
            .write("notes", &[note(1, "a"), note(2, "b")])
            .await
            .unwrap();

        assert!(store.delete("notes", |n: &Note| n.id == 1).await.unwrap());
        assert!(!store.delete("notes", |n: &Note| n.id == 1).await.unwrap());

        let notes: Vec<Note> = store.read("notes").await.unwrap();
        assert_eq!(notes, vec![note(2, "b")]);
    }

    #[tokio::test]
    async fn test_insert_unique_rejects_conflict() {
        let (_dir, store) = store();
        store.insert("notes", note(1, "a")).await.unwrap();

        let err = store
            .insert_unique("notes", note(2, "a"), |existing: &[Note]| {
                existing
                    .iter()
                    .any(|n| n.body == "a")
                    .then(|| RepositoryError::Conflict {
                        field: "body",
                        message: "duplicate body".to_owned(),
                    })
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Conflict { field: "body", .. }));
        assert_eq!(store.read::<Note>("notes").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_are_not_lost() {
        let (_dir, store) = store();
        let store = std::sync::Arc::new(store);

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.insert("notes", note(i, "x")).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.read::<Note>("notes").await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_data_dir_created_on_first_write() {
        let (_dir, store) = store();
        assert!(!store.is_writable().await);

        store.write::<Note>("notes", &[]).await.unwrap();
        assert!(store.is_writable().await);
    }
}
