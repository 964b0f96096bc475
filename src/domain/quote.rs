//! Per-instrument best-quote reduction.
//!
//! [`QuoteBoard`] is the fold target for a region scan: every order from every
//! page is folded in as it arrives, and `finalize` produces the snapshot. The
//! fold is commutative over page arrival order, so concurrent page workers can
//! share one board as long as each instrument's entry is updated atomically —
//! which the entry lock provides.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::order::{Order, OrderSummary};
use super::snapshot::RegionSnapshot;

/// The best resting buy and sell for one instrument in one region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BestQuote {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_buy: Option<OrderSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_sell: Option<OrderSummary>,
}

impl BestQuote {
    /// Fold one order into the quote. Buy side keeps the maximum price, sell
    /// side the minimum. On an exact price tie the first order folded wins;
    /// consumers must not rely on which venue wins a tie.
    pub fn fold(&mut self, order: &Order) {
        if order.is_buy_order {
            let better = match &self.best_buy {
                Some(current) => order.price > current.price,
                None => true,
            };
            if better {
                self.best_buy = Some(OrderSummary::from(order));
            }
        } else {
            let better = match &self.best_sell {
                Some(current) => order.price < current.price,
                None => true,
            };
            if better {
                self.best_sell = Some(OrderSummary::from(order));
            }
        }
    }
}

/// Shared fold target for one region scan.
///
/// Thread-safe: page workers call [`QuoteBoard::fold`] concurrently.
pub struct QuoteBoard {
    quotes: DashMap<u32, BestQuote>,
    structure_ids: Mutex<BTreeSet<i64>>,
}

impl QuoteBoard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            quotes: DashMap::new(),
            structure_ids: Mutex::new(BTreeSet::new()),
        }
    }

    /// Fold one order into the board.
    pub fn fold(&self, order: &Order) {
        self.quotes.entry(order.instrument_id).or_default().fold(order);

        if order.is_structure_venue() {
            self.structure_ids.lock().insert(order.venue_id);
        }
    }

    /// Number of distinct instruments seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Consume the board into a snapshot stamped with `last_updated`.
    #[must_use]
    pub fn finalize(self, region_id: u32, last_updated: DateTime<Utc>) -> RegionSnapshot {
        let best_quotes: BTreeMap<u32, BestQuote> = self.quotes.into_iter().collect();
        RegionSnapshot {
            region_id,
            last_updated,
            best_quotes,
            structure_ids: self.structure_ids.into_inner(),
        }
    }
}

impl Default for QuoteBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order(instrument_id: u32, price: &str, is_buy: bool, venue_id: i64) -> Order {
        Order {
            instrument_id,
            venue_id,
            price: price.parse().unwrap(),
            volume_remain: 100,
            is_buy_order: is_buy,
            range: None,
            issued: None,
            duration: None,
        }
    }

    #[test]
    fn buy_side_keeps_maximum_price() {
        let mut quote = BestQuote::default();
        quote.fold(&order(34, "5.00", true, 1));
        quote.fold(&order(34, "7.00", true, 2));
        quote.fold(&order(34, "6.00", true, 3));
        assert_eq!(quote.best_buy.unwrap().price, dec!(7.00));
    }

    #[test]
    fn sell_side_keeps_minimum_price() {
        let mut quote = BestQuote::default();
        quote.fold(&order(34, "5.00", false, 1));
        quote.fold(&order(34, "4.50", false, 2));
        quote.fold(&order(34, "6.00", false, 3));
        assert_eq!(quote.best_sell.unwrap().price, dec!(4.50));
    }

    #[test]
    fn first_folded_wins_price_tie() {
        let mut quote = BestQuote::default();
        quote.fold(&order(34, "5.00", false, 111));
        quote.fold(&order(34, "5.00", false, 222));
        assert_eq!(quote.best_sell.unwrap().venue_id, 111);
    }

    #[test]
    fn sides_are_independent() {
        let mut quote = BestQuote::default();
        quote.fold(&order(34, "4.00", true, 1));
        quote.fold(&order(34, "5.00", false, 2));
        assert_eq!(quote.best_buy.unwrap().price, dec!(4.00));
        assert_eq!(quote.best_sell.unwrap().price, dec!(5.00));
    }

    #[test]
    fn board_fold_is_commutative_over_arrival_order() {
        let orders = vec![
            order(34, "5.00", false, 1),
            order(34, "4.75", false, 2),
            order(34, "3.10", true, 3),
            order(34, "3.55", true, 4),
            order(35, "100.00", false, 5),
            order(35, "90.00", true, 6),
        ];

        let forward = QuoteBoard::new();
        for o in &orders {
            forward.fold(o);
        }
        let reversed = QuoteBoard::new();
        for o in orders.iter().rev() {
            reversed.fold(o);
        }

        let now = Utc::now();
        let a = forward.finalize(10000002, now);
        let b = reversed.finalize(10000002, now);
        assert_eq!(a.best_quotes, b.best_quotes);
        assert_eq!(a.best_quotes[&34].best_sell.as_ref().unwrap().price, dec!(4.75));
        assert_eq!(a.best_quotes[&34].best_buy.as_ref().unwrap().price, dec!(3.55));
    }

    #[test]
    fn board_collects_structure_venues_only() {
        let board = QuoteBoard::new();
        board.fold(&order(34, "5.00", false, 999_999_999_999));
        board.fold(&order(34, "5.10", false, 1_000_000_000_001));
        let snapshot = board.finalize(10000002, Utc::now());
        assert!(!snapshot.structure_ids.contains(&999_999_999_999));
        assert!(snapshot.structure_ids.contains(&1_000_000_000_001));
    }
}
