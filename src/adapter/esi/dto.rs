//! Ingress DTOs for the upstream order feed.
//!
//! The upstream payload is loosely typed in practice, so each record is
//! deserialized individually and coerced into the domain [`Order`]. Records
//! that fail coercion are dropped and counted, never fatal for the page.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::Order;

#[derive(Debug, Deserialize)]
pub(super) struct RawOrder {
    type_id: Option<u32>,
    location_id: Option<i64>,
    price: Option<Decimal>,
    volume_remain: Option<i64>,
    is_buy_order: Option<bool>,
    range: Option<String>,
    issued: Option<String>,
    duration: Option<i32>,
}

impl RawOrder {
    fn into_order(self) -> Option<Order> {
        Some(Order {
            instrument_id: self.type_id?,
            venue_id: self.location_id?,
            price: self.price?,
            volume_remain: self.volume_remain?,
            is_buy_order: self.is_buy_order?,
            range: self.range,
            issued: self
                .issued
                .and_then(|s| s.parse::<DateTime<Utc>>().ok()),
            duration: self.duration,
        })
    }
}

/// Coerce a page body into domain orders, counting dropped records.
pub(super) fn coerce_orders(records: Vec<serde_json::Value>) -> (Vec<Order>, usize) {
    let total = records.len();
    let orders: Vec<Order> = records
        .into_iter()
        .filter_map(|value| {
            serde_json::from_value::<RawOrder>(value)
                .ok()
                .and_then(RawOrder::into_order)
        })
        .collect();
    let dropped = total - orders.len();
    (orders, dropped)
}
