//! Paged region scan: discover the page count, fetch pages with a bounded
//! worker pool, and stream every order into the quote reduction.
//!
//! Orders are folded as pages arrive rather than buffered, so peak memory is
//! independent of region size. A failed later page degrades the snapshot's
//! completeness; only a failed first page aborts the region, because without
//! it the page count is unknown.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::config::ScanConfig;
use crate::domain::{QuoteBoard, RegionSnapshot};
use crate::error::{Result, UpstreamError};
use crate::port::{OrderPage, OrderPages, PageError};
use crate::service::RequestGate;

/// Result of scanning one region.
#[derive(Debug)]
pub struct ScanOutcome {
    pub snapshot: RegionSnapshot,
    pub pages_total: u32,
    /// Pages that needed at least one retry.
    pub pages_retried: usize,
    /// Pages dropped after a permanent failure or retry exhaustion.
    pub pages_dropped: usize,
    /// Order records dropped during ingress coercion.
    pub records_dropped: usize,
}

impl ScanOutcome {
    /// Whether the snapshot was built from less than full page coverage.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.pages_dropped > 0
    }
}

/// Fetch-and-reduce for one region at a time.
#[derive(Clone)]
pub struct RegionScan {
    pages: Arc<dyn OrderPages>,
    gate: Arc<RequestGate>,
    config: ScanConfig,
}

/// Upper bound on a single backoff sleep, whatever the attempt count.
const MAX_BACKOFF_MS: u64 = 10_000;

impl RegionScan {
    #[must_use]
    pub fn new(pages: Arc<dyn OrderPages>, gate: Arc<RequestGate>, config: ScanConfig) -> Self {
        Self {
            pages,
            gate,
            config,
        }
    }

    /// Fetch one page, retrying transient failures with capped exponential
    /// backoff. Every attempt passes through the rate limiter first.
    async fn fetch_with_retry(
        &self,
        region_id: u32,
        page: u32,
        retried: &AtomicUsize,
    ) -> std::result::Result<OrderPage, PageError> {
        let max_attempts = self.config.retry_max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.gate.acquire().await;

            match self.pages.fetch_page(region_id, page).await {
                Ok(fetched) => return Ok(fetched),
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    if attempt == 1 {
                        retried.fetch_add(1, Ordering::Relaxed);
                    }
                    let backoff = (self.config.retry_backoff_ms << (attempt - 1))
                        .min(MAX_BACKOFF_MS);
                    warn!(
                        region_id,
                        page,
                        attempt,
                        max_attempts,
                        backoff_ms = backoff,
                        error = %err,
                        "Page fetch failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Scan a whole region into a fresh snapshot.
    pub async fn scan(&self, region_id: u32) -> Result<ScanOutcome> {
        let board = Arc::new(QuoteBoard::new());
        let retried = Arc::new(AtomicUsize::new(0));
        let pages_dropped = Arc::new(AtomicUsize::new(0));
        let records_dropped = Arc::new(AtomicUsize::new(0));

        // Page 1 first, synchronously: it carries the page count.
        let first = self
            .fetch_with_retry(region_id, 1, &retried)
            .await
            .map_err(|err| UpstreamError::FirstPageFailed {
                region_id,
                reason: err.to_string(),
            })?;

        let pages_total = first.total_pages.unwrap_or(1).max(1);
        records_dropped.fetch_add(first.records_dropped, Ordering::Relaxed);
        for order in &first.orders {
            board.fold(order);
        }
        debug!(region_id, pages_total, "Discovered page count");

        if pages_total > 1 {
            let cursor = Arc::new(AtomicU32::new(2));
            let workers = self
                .config
                .page_concurrency
                .min(pages_total as usize - 1)
                .max(1);

            let mut pool = JoinSet::new();
            for _ in 0..workers {
                let scan = self.clone();
                let board = Arc::clone(&board);
                let cursor = Arc::clone(&cursor);
                let retried = Arc::clone(&retried);
                let pages_dropped = Arc::clone(&pages_dropped);
                let records_dropped = Arc::clone(&records_dropped);

                pool.spawn(async move {
                    loop {
                        let page = cursor.fetch_add(1, Ordering::SeqCst);
                        if page > pages_total {
                            break;
                        }
                        match scan.fetch_with_retry(region_id, page, &retried).await {
                            Ok(fetched) => {
                                records_dropped
                                    .fetch_add(fetched.records_dropped, Ordering::Relaxed);
                                for order in &fetched.orders {
                                    board.fold(order);
                                }
                            }
                            Err(err) => {
                                warn!(region_id, page, error = %err, "Dropping page");
                                pages_dropped.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                        tokio::time::sleep(Duration::from_millis(scan.config.page_pacing_ms))
                            .await;
                    }
                });
            }

            while let Some(joined) = pool.join_next().await {
                if let Err(err) = joined {
                    warn!(region_id, error = %err, "Page worker failed");
                    pages_dropped.fetch_add(1, Ordering::Relaxed);
                }
            }
        }

        let board = Arc::into_inner(board).expect("all page workers joined");
        Ok(ScanOutcome {
            snapshot: board.finalize(region_id, Utc::now()),
            pages_total,
            pages_retried: retried.load(Ordering::Relaxed),
            pages_dropped: pages_dropped.load(Ordering::Relaxed),
            records_dropped: records_dropped.load(Ordering::Relaxed),
        })
    }
}
