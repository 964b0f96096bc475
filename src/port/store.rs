//! Versioned content store ports.

use async_trait::async_trait;

use crate::error::Result;

/// One branch of one repository that artifacts are mirrored to. Resolved once
/// per process from configuration; read-only during execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTarget {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub data_prefix: String,
}

impl PublishTarget {
    /// Short label for logs and per-target result lists.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}/{}@{}", self.owner, self.repo, self.branch)
    }
}

/// Current remote state of one path: the store's version token plus the
/// decoded content. The version token is the write precondition.
#[derive(Debug, Clone)]
pub struct RemoteContent {
    pub version: String,
    pub content: Vec<u8>,
}

/// One file in a bulk replacement.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub path: String,
    pub content: String,
}

/// Authenticated write path of the versioned store.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read current content and version at `path`. `Ok(None)` when absent.
    async fn read(&self, target: &PublishTarget, path: &str) -> Result<Option<RemoteContent>>;

    /// Create or update `path`. When `expected_version` is `Some`, the store
    /// must reject the write if the path has moved past that version since it
    /// was read (last-writer-detection, not last-writer-wins).
    async fn write(
        &self,
        target: &PublishTarget,
        path: &str,
        content: &str,
        message: &str,
        expected_version: Option<&str>,
    ) -> Result<()>;

    /// Replace many files in a single store transaction (one commit).
    async fn bulk_replace(
        &self,
        target: &PublishTarget,
        files: &[FileEntry],
        message: &str,
    ) -> Result<()>;
}

/// Public unauthenticated read path (CDN-backed). `Ok(None)` when absent.
#[async_trait]
pub trait PublishedReader: Send + Sync {
    async fn read_published(&self, target: &PublishTarget, path: &str) -> Result<Option<String>>;
}
