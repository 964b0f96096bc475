//! Upstream market API ports.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Order;
use crate::error::Result;

/// One fetched page of a region's order list.
#[derive(Debug, Clone)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    /// Total page count discovered from response metadata, when present.
    /// Only page 1 is expected to carry it, but any page may.
    pub total_pages: Option<u32>,
    /// Records on this page that failed ingress validation and were dropped.
    pub records_dropped: usize,
}

/// Page fetch failure, classified for the retry policy.
#[derive(Debug, Error)]
pub enum PageError {
    /// Rate limiting (420/429), server errors, timeouts: retry the same page.
    #[error("retryable upstream failure: {reason}")]
    Retryable { reason: String },

    /// Other client errors: the page will never succeed, drop it.
    #[error("permanent upstream failure: {reason}")]
    Permanent { reason: String },
}

impl PageError {
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable { .. })
    }
}

/// Paginated order source for one region.
#[async_trait]
pub trait OrderPages: Send + Sync {
    /// Fetch one page of the region's order list. Pages are 1-based.
    async fn fetch_page(
        &self,
        region_id: u32,
        page: u32,
    ) -> std::result::Result<OrderPage, PageError>;
}

/// Enumerates the universe of valid region ids.
#[async_trait]
pub trait RegionDirectory: Send + Sync {
    async fn region_ids(&self) -> Result<Vec<u32>>;
}
