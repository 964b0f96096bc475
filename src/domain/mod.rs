//! Exchange-agnostic domain types and pure logic.
//!
//! Nothing in this module performs I/O. The reduction, freshness decision, and
//! report bookkeeping are all pure so they can be tested without a network.

pub mod freshness;
pub mod order;
pub mod quote;
pub mod report;
pub mod snapshot;

pub use freshness::{FreshnessDecision, FreshnessReason};
pub use order::{Order, OrderSummary, STRUCTURE_ID_FLOOR};
pub use quote::{BestQuote, QuoteBoard};
pub use report::{RegionOutcome, RunReport};
pub use snapshot::RegionSnapshot;
