//! Expired record cleanup.
//!
//! The storefront drops an expired session lazily when its cookie is next
//! presented. Sessions that are never presented again, and verification
//! tokens that are never used, stay on disk until this runs.

use clap::ValueEnum;
use marketplace_storefront::db::{
    JsonStore, RepositoryError, SessionRepository, VerificationTokenRepository,
};

/// Which collections to clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CleanupTarget {
    /// Expired sessions only
    Sessions,
    /// Expired verification tokens only
    Tokens,
    /// Both
    All,
}

/// How many records were removed from each collection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupReport {
    pub sessions: usize,
    pub verification_tokens: usize,
}

/// Delete expired records from the selected collections.
///
/// # Errors
///
/// Returns `RepositoryError` for storage failures.
pub async fn run(store: &JsonStore, target: CleanupTarget) -> Result<CleanupReport, RepositoryError> {
    let mut report = CleanupReport::default();

    if matches!(target, CleanupTarget::Sessions | CleanupTarget::All) {
        report.sessions = SessionRepository::new(store).cleanup_expired().await?;
    }
    if matches!(target, CleanupTarget::Tokens | CleanupTarget::All) {
        report.verification_tokens = VerificationTokenRepository::new(store)
            .cleanup_expired()
            .await?;
    }

    Ok(report)
}
