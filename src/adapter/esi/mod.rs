//! Upstream market API adapter.

mod client;
mod dto;

pub use client::MarketApiClient;
