//! Published region snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::quote::BestQuote;

/// The full best-quote summary for one region at one point in time, published
/// as a single artifact. Regeneration always produces a fresh snapshot from a
/// full re-scan; snapshots are never patched incrementally because the
/// upstream order list is swapped wholesale between polls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSnapshot {
    pub region_id: u32,
    pub last_updated: DateTime<Utc>,
    /// BTreeMap keeps the serialized artifact deterministic, so byte-level
    /// change detection in the publisher does not see spurious diffs.
    pub best_quotes: BTreeMap<u32, BestQuote>,
    pub structure_ids: BTreeSet<i64>,
}

impl RegionSnapshot {
    /// Serialize to the published artifact shape.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Path of this snapshot under a target's data prefix.
    #[must_use]
    pub fn artifact_path(region_id: u32, data_prefix: &str) -> String {
        format!("{data_prefix}/region_orders/{region_id}.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderSummary;
    use rust_decimal_macros::dec;

    #[test]
    fn artifact_path_follows_convention() {
        assert_eq!(
            RegionSnapshot::artifact_path(10000002, "docs/data"),
            "docs/data/region_orders/10000002.json"
        );
    }

    #[test]
    fn snapshot_serializes_expected_shape() {
        let mut best_quotes = BTreeMap::new();
        best_quotes.insert(
            34,
            BestQuote {
                best_buy: None,
                best_sell: Some(OrderSummary {
                    price: dec!(5.05),
                    venue_id: 60003760,
                    volume_remain: 1000,
                    range: None,
                    issued: None,
                    duration: None,
                }),
            },
        );
        let snapshot = RegionSnapshot {
            region_id: 10000002,
            last_updated: "2024-01-01T00:00:00Z".parse().unwrap(),
            best_quotes,
            structure_ids: BTreeSet::from([1_000_000_000_001]),
        };

        let json: serde_json::Value =
            serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(json["region_id"], 10000002);
        assert_eq!(json["last_updated"], "2024-01-01T00:00:00Z");
        assert_eq!(json["best_quotes"]["34"]["best_sell"]["venue_id"], 60003760);
        assert!(json["best_quotes"]["34"].get("best_buy").is_none());
        assert_eq!(json["structure_ids"][0], 1_000_000_000_001_i64);
    }

    #[test]
    fn snapshot_round_trips() {
        let snapshot = RegionSnapshot {
            region_id: 10000043,
            last_updated: Utc::now(),
            best_quotes: BTreeMap::new(),
            structure_ids: BTreeSet::new(),
        };
        let parsed: RegionSnapshot =
            serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(parsed, snapshot);
    }
}
