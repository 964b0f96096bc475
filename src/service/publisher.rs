//! Idempotent snapshot publishing across one or more targets.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::RegionSnapshot;
use crate::error::Result;
use crate::port::{FileEntry, PublishTarget, SnapshotStore};

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Written,
    /// Remote content was byte-identical; no new version was created.
    Unchanged,
}

/// Publishes artifacts to every configured target independently: one target
/// failing never aborts the others, and partial publish success is a valid
/// outcome reported per target.
pub struct Publisher {
    store: Arc<dyn SnapshotStore>,
    targets: Vec<PublishTarget>,
}

impl Publisher {
    #[must_use]
    pub fn new(store: Arc<dyn SnapshotStore>, targets: Vec<PublishTarget>) -> Self {
        Self { store, targets }
    }

    #[must_use]
    pub fn targets(&self) -> &[PublishTarget] {
        &self.targets
    }

    /// Write `content` at `path` on one target unless it is already there.
    ///
    /// The current remote content is read first and compared byte-for-byte;
    /// identical content skips the write entirely so unchanged data never
    /// creates a new version. The read's version token is passed as the write
    /// precondition, so racing a concurrent writer surfaces as a conflict
    /// instead of a silent overwrite.
    pub async fn upsert(
        &self,
        target: &PublishTarget,
        path: &str,
        content: &str,
        message: &str,
    ) -> Result<UpsertOutcome> {
        let existing = self.store.read(target, path).await?;

        if let Some(remote) = &existing {
            if remote.content == content.as_bytes() {
                debug!(target = %target.label(), path, "Content unchanged, skipping write");
                return Ok(UpsertOutcome::Unchanged);
            }
        }

        let expected = existing.as_ref().map(|r| r.version.as_str());
        self.store
            .write(target, path, content, message, expected)
            .await?;
        Ok(UpsertOutcome::Written)
    }

    /// Upsert one region's snapshot to every target. Outcomes are returned
    /// per target label; failures are logged and do not stop other targets.
    pub async fn publish_region(
        &self,
        region_id: u32,
        content: &str,
        message: &str,
    ) -> Vec<(String, Result<UpsertOutcome>)> {
        let mut results = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            let path = RegionSnapshot::artifact_path(region_id, &target.data_prefix);
            let outcome = self.upsert(target, &path, content, message).await;
            match &outcome {
                Ok(UpsertOutcome::Written) => {
                    info!(region_id, target = %target.label(), "Published snapshot");
                }
                Ok(UpsertOutcome::Unchanged) => {
                    debug!(region_id, target = %target.label(), "Snapshot unchanged");
                }
                Err(err) => {
                    warn!(region_id, target = %target.label(), error = %err, "Publish failed");
                }
            }
            results.push((target.label(), outcome));
        }
        results
    }

    /// Flush a batch of regenerated snapshots as one commit per target
    /// ("bulk squash"). Skipped entirely when the batch is empty.
    pub async fn bulk_flush(
        &self,
        snapshots: &[(u32, String)],
        message: &str,
    ) -> Vec<(String, Result<()>)> {
        if snapshots.is_empty() {
            debug!("No regenerated snapshots, skipping bulk flush");
            return Vec::new();
        }

        let mut results = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            let files: Vec<FileEntry> = snapshots
                .iter()
                .map(|(region_id, content)| FileEntry {
                    path: RegionSnapshot::artifact_path(*region_id, &target.data_prefix),
                    content: content.clone(),
                })
                .collect();

            let outcome = self.store.bulk_replace(target, &files, message).await;
            match &outcome {
                Ok(()) => {
                    info!(
                        target = %target.label(),
                        files = files.len(),
                        "Bulk flushed snapshots"
                    );
                }
                Err(err) => {
                    warn!(target = %target.label(), error = %err, "Bulk flush failed");
                }
            }
            results.push((target.label(), outcome));
        }
        results
    }
}
