//! Region orchestration: a latency-sensitive hub pass and a
//! throughput-oriented bulk pass over the rest of the universe.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::OrchestratorConfig;
use crate::domain::{RegionOutcome, RunReport};
use crate::error::Result;
use crate::port::RegionDirectory;
use crate::service::{FreshnessGate, Publisher, RegionScan};

type SnapshotSink = Mutex<Vec<(u32, String)>>;

/// Drives freshness checks, scans, and publishes over a queue of regions.
///
/// Two policies share the same worker-pool primitive: `run_hubs` processes a
/// small fixed priority list and publishes each region as soon as it is
/// ready; `run_bulk` drains every remaining region and, in bulk mode, squashes
/// all resulting writes into a single commit per target at the end.
#[derive(Clone)]
pub struct Orchestrator {
    scan: RegionScan,
    gate: Arc<FreshnessGate>,
    publisher: Arc<Publisher>,
    directory: Arc<dyn RegionDirectory>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        scan: RegionScan,
        gate: Arc<FreshnessGate>,
        publisher: Arc<Publisher>,
        directory: Arc<dyn RegionDirectory>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            scan,
            gate,
            publisher,
            directory,
            config,
        }
    }

    /// Process the fixed hub list, publishing each region individually so hub
    /// data lands as soon as it is ready.
    pub async fn run_hubs(&self) -> RunReport {
        info!(regions = self.config.hub_regions.len(), "Starting hub pass");
        let report = self
            .drain(
                self.config.hub_regions.clone(),
                self.config.hub_concurrency,
                None,
            )
            .await;
        info!(?report, "Hub pass finished");
        report
    }

    /// Process every region except the hubs. In bulk mode all publishes are
    /// collected and flushed as one commit per target at the end.
    ///
    /// The region-directory call is the only fatal failure here; everything
    /// past it is recovered per region or per target.
    pub async fn run_bulk(&self) -> Result<RunReport> {
        let all = self.directory.region_ids().await?;
        let hubs: HashSet<u32> = self.config.hub_regions.iter().copied().collect();
        let queue: Vec<u32> = all.into_iter().filter(|id| !hubs.contains(id)).collect();

        info!(
            regions = queue.len(),
            bulk_mode = self.config.bulk_mode,
            "Starting bulk pass"
        );

        let sink = self
            .config
            .bulk_mode
            .then(|| Arc::new(SnapshotSink::new(Vec::new())));

        let report = self
            .drain(queue, self.config.bulk_concurrency, sink.clone())
            .await;

        if let Some(sink) = sink {
            let snapshots = std::mem::take(&mut *sink.lock());
            let message = format!("Bulk refresh of {} region snapshots", snapshots.len());
            for (label, outcome) in self.publisher.bulk_flush(&snapshots, &message).await {
                if let Err(err) = outcome {
                    error!(target = %label, error = %err, "Bulk flush failed for target");
                }
            }
        }

        info!(?report, "Bulk pass finished");
        Ok(report)
    }

    /// Hub pass followed by the bulk pass.
    pub async fn run(&self) -> Result<RunReport> {
        let mut report = self.run_hubs().await;
        report.merge(self.run_bulk().await?);
        Ok(report)
    }

    /// Scan and publish one region unconditionally (no freshness check).
    pub async fn run_region(&self, region_id: u32) -> RunReport {
        let mut report = RunReport::default();
        self.regenerate(region_id, None, &mut report).await;
        report
    }

    /// Drain a queue of region ids with a bounded worker pool. Each worker
    /// claims the next unclaimed region until the queue is empty; one bad
    /// region never stops the others.
    async fn drain(
        &self,
        regions: Vec<u32>,
        concurrency: usize,
        sink: Option<Arc<SnapshotSink>>,
    ) -> RunReport {
        if regions.is_empty() {
            return RunReport::default();
        }

        let queue = Arc::new(regions);
        let cursor = Arc::new(AtomicUsize::new(0));
        let workers = concurrency.min(queue.len()).max(1);

        let mut pool = JoinSet::new();
        for _ in 0..workers {
            let orchestrator = self.clone();
            let queue = Arc::clone(&queue);
            let cursor = Arc::clone(&cursor);
            let sink = sink.clone();

            pool.spawn(async move {
                let mut report = RunReport::default();
                loop {
                    let index = cursor.fetch_add(1, Ordering::SeqCst);
                    let Some(&region_id) = queue.get(index) else {
                        break;
                    };
                    orchestrator
                        .process_region(region_id, sink.as_deref(), &mut report)
                        .await;
                }
                report
            });
        }

        let mut total = RunReport::default();
        while let Some(joined) = pool.join_next().await {
            match joined {
                Ok(report) => total.merge(report),
                Err(err) => warn!(error = %err, "Region worker failed"),
            }
        }
        total
    }

    async fn process_region(
        &self,
        region_id: u32,
        sink: Option<&SnapshotSink>,
        report: &mut RunReport,
    ) {
        let decision = self.gate.check(region_id).await;
        if !decision.regenerate {
            debug!(region_id, "Snapshot still fresh, skipping");
            report.record(RegionOutcome::SkippedFresh);
            return;
        }
        self.regenerate(region_id, sink, report).await;
    }

    async fn regenerate(
        &self,
        region_id: u32,
        sink: Option<&SnapshotSink>,
        report: &mut RunReport,
    ) {
        let outcome = match self.scan.scan(region_id).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(region_id, error = %err, "Region scan failed");
                report.record(RegionOutcome::Failed);
                return;
            }
        };

        report.pages_retried += outcome.pages_retried;
        report.pages_dropped += outcome.pages_dropped;
        report.records_dropped += outcome.records_dropped;

        let content = match outcome.snapshot.to_json() {
            Ok(content) => content,
            Err(err) => {
                warn!(region_id, error = %err, "Snapshot serialization failed");
                report.record(RegionOutcome::Failed);
                return;
            }
        };

        if let Some(sink) = sink {
            sink.lock().push((region_id, content));
        } else {
            let message = format!("Update market snapshot for region {region_id}");
            let results = self
                .publisher
                .publish_region(region_id, &content, &message)
                .await;
            let all_failed = !results.is_empty() && results.iter().all(|(_, r)| r.is_err());
            if all_failed {
                report.record(RegionOutcome::Failed);
                return;
            }
        }

        report.record(if outcome.is_partial() {
            RegionOutcome::Partial
        } else {
            RegionOutcome::Succeeded
        });
    }
}
