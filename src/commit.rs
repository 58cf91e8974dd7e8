//! Commit provenance and the stage-then-commit step

use anyhow::{Context, Result};
use chrono::Local;
use std::path::Path;
use tracing::info;

use crate::git::GitClient;

/// Provenance shared by every commit made during one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMetadata {
    pub timestamp: String,
    pub archive_commit: String,
    pub emacs_commit: String,
}

impl CommitMetadata {
    pub fn new(
        timestamp: impl Into<String>,
        archive_commit: impl Into<String>,
        emacs_commit: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            archive_commit: archive_commit.into(),
            emacs_commit: emacs_commit.into(),
        }
    }

    /// Stamp the given upstream commits with the current local time
    pub fn now(archive_commit: impl Into<String>, emacs_commit: impl Into<String>) -> Self {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        Self::new(timestamp, archive_commit, emacs_commit)
    }

    /// Summary line, blank line, then the metadata block
    pub fn message(&self, summary: &str) -> String {
        format!(
            "{}\n\nTimestamp: {}\nGNU ELPA commit: {}\nEmacs commit: {}",
            summary, self.timestamp, self.archive_commit, self.emacs_commit
        )
    }
}

/// What [`stage_and_commit`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    NoChanges,
}

/// Stage everything in `dir` and commit it if anything is staged
pub async fn stage_and_commit(
    git: &GitClient,
    dir: &Path,
    summary: &str,
    metadata: &CommitMetadata,
) -> Result<CommitOutcome> {
    git.add_all(dir)
        .await
        .with_context(|| format!("Failed to stage changes in {}", dir.display()))?;

    if !git.has_staged_changes(dir).await? {
        info!("(no changes)");
        return Ok(CommitOutcome::NoChanges);
    }

    git.commit(dir, &metadata.message(summary))
        .await
        .with_context(|| format!("Failed to commit in {}", dir.display()))?;

    Ok(CommitOutcome::Committed)
}
