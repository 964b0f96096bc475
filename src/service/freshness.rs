//! Freshness gate: decides whether a region's published snapshot needs
//! regenerating, from the public read path only.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::domain::{freshness, FreshnessDecision, RegionSnapshot};
use crate::port::{PublishTarget, PublishedReader};

/// Reads the previously published snapshot and applies the age policy.
///
/// Reads go through the public unauthenticated path so freshness checks never
/// consume write-side rate limits. Any read failure is treated as a missing
/// snapshot: the gate fails open toward regeneration, it never silently skips
/// a region because of a read glitch.
pub struct FreshnessGate {
    reader: Arc<dyn PublishedReader>,
    target: PublishTarget,
    max_age_ms: i64,
}

impl FreshnessGate {
    #[must_use]
    pub fn new(reader: Arc<dyn PublishedReader>, target: PublishTarget, max_age_ms: i64) -> Self {
        Self {
            reader,
            target,
            max_age_ms,
        }
    }

    pub async fn check(&self, region_id: u32) -> FreshnessDecision {
        let path = RegionSnapshot::artifact_path(region_id, &self.target.data_prefix);

        let body = match self.reader.read_published(&self.target, &path).await {
            Ok(body) => body,
            Err(err) => {
                warn!(region_id, error = %err, "Freshness read failed, treating as missing");
                None
            }
        };

        let decision = freshness::decide(body.as_deref(), Utc::now(), self.max_age_ms);
        debug!(
            region_id,
            regenerate = decision.regenerate,
            reason = ?decision.reason,
            age_ms = decision.observed_age_ms,
            "Freshness decision"
        );
        decision
    }
}
