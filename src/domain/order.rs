//! Resting market orders as read from the upstream order book.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Venue identifiers at or above this value are player-owned structures;
/// below it they are static NPC stations. There is no lookup table upstream,
/// the identifier space itself encodes the distinction.
pub const STRUCTURE_ID_FLOOR: i64 = 1_000_000_000_000;

/// One resting order on a venue. Immutable once read; the pipeline never
/// mutates orders, it only folds them into per-instrument best quotes.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub instrument_id: u32,
    pub venue_id: i64,
    pub price: Decimal,
    pub volume_remain: i64,
    pub is_buy_order: bool,
    pub range: Option<String>,
    pub issued: Option<DateTime<Utc>>,
    pub duration: Option<i32>,
}

impl Order {
    /// Whether this order rests on a player-owned structure.
    #[must_use]
    pub fn is_structure_venue(&self) -> bool {
        self.venue_id >= STRUCTURE_ID_FLOOR
    }
}

/// The slice of an [`Order`] retained in a published snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub price: Decimal,
    pub venue_id: i64,
    pub volume_remain: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i32>,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        Self {
            price: order.price,
            venue_id: order.venue_id,
            volume_remain: order.volume_remain,
            range: order.range.clone(),
            issued: order.issued,
            duration: order.duration,
        }
    }
}
