//! Sliding-window outbound rate limiter.
//!
//! Every upstream call goes through [`RequestGate::acquire`], which suspends
//! the caller until one more call fits inside the trailing window. The gate
//! cannot fail, it can only delay.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::LimiterConfig;

/// Bounds outbound calls to `max_in_window` per sliding `window`.
///
/// Only timestamps inside the trailing window are tracked. When the window is
/// full, the wait is computed from when the oldest timestamp expires and then
/// re-checked in a loop, so bursty callers are neither under- nor
/// over-throttled. Shared by reference across all workers in a process.
pub struct RequestGate {
    max_in_window: usize,
    window: Duration,
    stamps: Mutex<VecDeque<Instant>>,
}

impl RequestGate {
    #[must_use]
    pub fn new(max_in_window: usize, window: Duration) -> Self {
        Self {
            max_in_window: max_in_window.max(1),
            window,
            stamps: Mutex::new(VecDeque::new()),
        }
    }

    #[must_use]
    pub fn from_config(config: &LimiterConfig) -> Self {
        Self::new(config.max_in_window, Duration::from_millis(config.window_ms))
    }

    /// Suspend until one more outbound call is safe, then record it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut stamps = self.stamps.lock();
                let now = Instant::now();

                while stamps
                    .front()
                    .is_some_and(|t| now.duration_since(*t) >= self.window)
                {
                    stamps.pop_front();
                }

                if stamps.len() < self.max_in_window {
                    stamps.push_back(now);
                    return;
                }

                // Wait exactly until the oldest live timestamp leaves the
                // window, then re-check rather than assuming a free slot.
                let oldest = *stamps.front().expect("window is at capacity");
                self.window - now.duration_since(oldest)
            };
            tokio::time::sleep(wait).await;
        }
    }

    /// Calls currently recorded inside the window.
    #[must_use]
    pub fn in_flight_window(&self) -> usize {
        let mut stamps = self.stamps.lock();
        let now = Instant::now();
        while stamps
            .front()
            .is_some_and(|t| now.duration_since(*t) >= self.window)
        {
            stamps.pop_front();
        }
        stamps.len()
    }
}
