//! Per-run outcome bookkeeping.

/// What happened to one region during an orchestration pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionOutcome {
    /// Regenerated and published with full page coverage.
    Succeeded,
    /// Regenerated and published, but one or more pages were dropped.
    Partial,
    /// Freshness gate said the published snapshot is still current.
    SkippedFresh,
    Failed,
}

/// Summary counters for one orchestration pass. Individual region and target
/// errors are logged where they happen; the report is what the run surfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub succeeded: usize,
    pub partial: usize,
    pub skipped_fresh: usize,
    pub failed: usize,
    pub pages_retried: usize,
    pub pages_dropped: usize,
    pub records_dropped: usize,
}

impl RunReport {
    pub fn record(&mut self, outcome: RegionOutcome) {
        match outcome {
            RegionOutcome::Succeeded => self.succeeded += 1,
            RegionOutcome::Partial => self.partial += 1,
            RegionOutcome::SkippedFresh => self.skipped_fresh += 1,
            RegionOutcome::Failed => self.failed += 1,
        }
    }

    pub fn merge(&mut self, other: RunReport) {
        self.succeeded += other.succeeded;
        self.partial += other.partial;
        self.skipped_fresh += other.skipped_fresh;
        self.failed += other.failed;
        self.pages_retried += other.pages_retried;
        self.pages_dropped += other.pages_dropped;
        self.records_dropped += other.records_dropped;
    }

    #[must_use]
    pub fn regions_processed(&self) -> usize {
        self.succeeded + self.partial + self.skipped_fresh + self.failed
    }
}
