//! Pipeline services: rate limiting, paged scanning, freshness gating,
//! publishing, and region orchestration.

mod freshness;
mod limiter;
mod orchestrator;
mod publisher;
mod scan;

pub use freshness::FreshnessGate;
pub use limiter::RequestGate;
pub use orchestrator::Orchestrator;
pub use publisher::{Publisher, UpsertOutcome};
pub use scan::{RegionScan, ScanOutcome};
